//! 计数聚合：记录集合 → 计数快照

use serde::{Deserialize, Serialize};

use crate::store::{CounterField, CounterValues};
use crate::types::{Color, EggRecord, Quality, Size, ratio_as_percentage};

/// 尺寸直方图
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeHistogram {
    pub small: u64,
    pub medium: u64,
    pub large: u64,
    pub xlarge: u64,
}

impl SizeHistogram {
    #[must_use]
    pub const fn get(&self, size: Size) -> u64 {
        match size {
            Size::Small => self.small,
            Size::Medium => self.medium,
            Size::Large => self.large,
            Size::Xlarge => self.xlarge,
        }
    }

    const fn slot_mut(&mut self, size: Size) -> &mut u64 {
        match size {
            Size::Small => &mut self.small,
            Size::Medium => &mut self.medium,
            Size::Large => &mut self.large,
            Size::Xlarge => &mut self.xlarge,
        }
    }
}

/// 计数快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    pub total: u64,
    pub good: u64,
    pub bad: u64,
    pub white: u64,
    pub brown: u64,
    pub sizes: SizeHistogram,
}

impl CounterSnapshot {
    /// 读取单个计数字段
    #[must_use]
    pub const fn get(&self, field: CounterField) -> u64 {
        match field {
            CounterField::Total => self.total,
            CounterField::Good => self.good,
            CounterField::Bad => self.bad,
            CounterField::White => self.white,
            CounterField::Brown => self.brown,
            CounterField::Size(size) => self.sizes.get(size),
        }
    }

    const fn slot_mut(&mut self, field: CounterField) -> &mut u64 {
        match field {
            CounterField::Total => &mut self.total,
            CounterField::Good => &mut self.good,
            CounterField::Bad => &mut self.bad,
            CounterField::White => &mut self.white,
            CounterField::Brown => &mut self.brown,
            CounterField::Size(size) => self.sizes.slot_mut(size),
        }
    }

    /// 由独立维护的计数字段组装快照，缺失字段按 0 处理
    #[must_use]
    pub fn from_values(values: &CounterValues) -> Self {
        let mut snapshot = Self::default();
        for (field, value) in values {
            *snapshot.slot_mut(*field) = *value;
        }
        snapshot
    }

    /// 计入一条记录
    pub fn record(&mut self, record: &EggRecord) {
        for field in counter_fields(record.size, record.color, record.quality) {
            let slot = self.slot_mut(field);
            *slot = slot.saturating_add(1);
        }
    }

    /// 合格率（百分比）
    #[must_use]
    pub fn good_rate(&self) -> f64 {
        ratio_as_percentage(self.good, self.total)
    }
}

/// 一条记录会影响的计数字段
///
/// 总数与品质字段总会出现；未单独统计的颜色和缺失的尺寸不产生字段。
#[must_use]
pub fn counter_fields(
    size: Option<Size>,
    color: Option<Color>,
    quality: Quality,
) -> Vec<CounterField> {
    let mut fields = Vec::with_capacity(4);
    fields.push(CounterField::Total);
    fields.push(match quality {
        Quality::Good => CounterField::Good,
        Quality::Bad => CounterField::Bad,
    });
    if let Some(field) = color.and_then(CounterField::for_color) {
        fields.push(field);
    }
    if let Some(size) = size {
        fields.push(CounterField::Size(size));
    }
    fields
}

/// 扫描记录集合计算计数快照
pub fn aggregate<'a, I>(records: I) -> CounterSnapshot
where
    I: IntoIterator<Item = &'a EggRecord>,
{
    records
        .into_iter()
        .fold(CounterSnapshot::default(), |mut snapshot, record| {
            snapshot.record(record);
            snapshot
        })
}
