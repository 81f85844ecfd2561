//! # 测试数据 Fixtures
//!
//! 提供测试用的数据结构和预设数据

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::types::{Color, EggRecord, Quality, RawEggRecord, Size};

/// 分拣记录构建器
#[derive(Debug, Clone)]
pub struct EggRecordFixture {
    pub size: Option<Size>,
    pub color: Option<Color>,
    pub quality: Quality,
    pub confidence: f64,
    pub source: String,
    pub timestamp: Option<DateTime<Utc>>,
}

impl Default for EggRecordFixture {
    fn default() -> Self {
        Self {
            size: Some(Size::Medium),
            color: Some(Color::White),
            quality: Quality::Good,
            confidence: 0.9,
            source: "ai-sorter".to_string(),
            timestamp: Some(fixed_now()),
        }
    }
}

impl EggRecordFixture {
    /// 创建新的记录 fixture
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    #[must_use]
    pub const fn no_size(mut self) -> Self {
        self.size = None;
        self
    }

    #[must_use]
    pub const fn color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    #[must_use]
    pub const fn no_color(mut self) -> Self {
        self.color = None;
        self
    }

    #[must_use]
    pub const fn good(mut self) -> Self {
        self.quality = Quality::Good;
        self
    }

    #[must_use]
    pub const fn bad(mut self) -> Self {
        self.quality = Quality::Bad;
        self
    }

    #[must_use]
    pub const fn confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    #[must_use]
    pub fn source(mut self, source: &str) -> Self {
        self.source = source.to_string();
        self
    }

    #[must_use]
    pub const fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// 相对 [`fixed_now`] 的分钟偏移
    #[must_use]
    pub fn minutes_ago(self, minutes: i64) -> Self {
        self.at(fixed_now() - Duration::minutes(minutes))
    }

    #[must_use]
    pub const fn no_timestamp(mut self) -> Self {
        self.timestamp = None;
        self
    }

    /// 构建已解析的记录
    #[must_use]
    pub fn build(self, id: &str) -> EggRecord {
        EggRecord {
            id: id.to_string(),
            size: self.size,
            color: self.color,
            quality: self.quality,
            confidence: self.confidence,
            source: self.source,
            timestamp: self.timestamp,
        }
    }

    /// 构建存储层的原始记录
    #[must_use]
    pub fn build_raw(self) -> RawEggRecord {
        RawEggRecord {
            size: self.size.map(|s| s.as_str().to_string()),
            color: self.color.map(|c| c.as_str().to_string()),
            quality: Some(self.quality.as_str().to_string()),
            confidence: Some(self.confidence),
            source: Some(self.source),
            timestamp: self
                .timestamp
                .map(|ts| crate::types::timezone_utils::format_for_storage(&ts)),
        }
    }
}

/// 测试使用的固定"当前时间": 2024-01-02 04:00 UTC（本地 12:00）
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 2, 4, 0, 0)
        .single()
        .unwrap_or_default()
}

/// 按 id 顺序生成 `count` 条记录，时间间隔一分钟，最新的在最后
#[must_use]
pub fn minute_series(count: usize) -> Vec<EggRecord> {
    (0..count)
        .map(|i| {
            let minutes_ago = i64::try_from(count - i).unwrap_or(i64::MAX);
            let size = Size::ALL[i % Size::ALL.len()];
            let fixture = EggRecordFixture::new().size(size).minutes_ago(minutes_ago);
            let fixture = if i % 3 == 0 { fixture.bad() } else { fixture };
            fixture.build(&format!("egg_{:08}", i + 1))
        })
        .collect()
}
