//! 分组汇总：按 (尺寸, 颜色, 品质) 计数，并统计来源

use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::{Color, EggRecord, MANUAL_SOURCE, Quality, Size};

/// 汇总表的一行
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub size: Option<Size>,
    pub color: Option<Color>,
    pub quality: Quality,
    pub count: u64,
}

/// 来源统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SourceTotals {
    /// 自动分拣设备产生的记录
    pub automated: u64,
    /// 手动录入的记录
    pub manual: u64,
    /// 其它来源
    pub other: u64,
    pub total: u64,
}

/// 按 (尺寸, 颜色, 品质) 分组计数
///
/// 输出按元组自然顺序排列；缺失的尺寸或颜色排在同位置已知值之前。
pub fn summarize<'a, I>(records: I) -> Vec<SummaryRow>
where
    I: IntoIterator<Item = &'a EggRecord>,
{
    let mut groups: BTreeMap<(Option<Size>, Option<Color>, Quality), u64> = BTreeMap::new();
    for record in records {
        *groups
            .entry((record.size, record.color, record.quality))
            .or_default() += 1;
    }

    groups
        .into_iter()
        .map(|((size, color, quality), count)| SummaryRow {
            size,
            color,
            quality,
            count,
        })
        .collect()
}

/// 统计自动/手动来源条数
pub fn source_totals<'a, I>(records: I, automated_sources: &[String]) -> SourceTotals
where
    I: IntoIterator<Item = &'a EggRecord>,
{
    let mut totals = SourceTotals::default();
    for record in records {
        let source = record.source.trim();
        totals.total += 1;
        if automated_sources
            .iter()
            .any(|tag| tag.eq_ignore_ascii_case(source))
        {
            totals.automated += 1;
        } else if source.eq_ignore_ascii_case(MANUAL_SOURCE) {
            totals.manual += 1;
        } else {
            totals.other += 1;
        }
    }
    totals
}
