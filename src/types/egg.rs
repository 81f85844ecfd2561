//! # 鸡蛋记录领域类型
//!
//! 尺寸/颜色/品质枚举、存储原始记录与解析后的记录，以及写入前的校验。
//! 存储中缺失或异常的字段只在 [`EggRecord::from_raw`] 这一处按默认值解析。

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::timezone::timezone_utils;
use crate::error::{DashboardError, Result};

/// 存储中缺少 `source` 时使用的来源标签
pub const DEFAULT_SOURCE: &str = "unknown";
/// 手动录入的来源标签
pub const MANUAL_SOURCE: &str = "manual";
/// 看板表单录入的来源标签
pub const WEB_DASHBOARD_SOURCE: &str = "web-dashboard";

/// 鸡蛋尺寸
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Size {
    Small,
    Medium,
    Large,
    Xlarge,
}

impl Size {
    /// 全部尺寸，按自然顺序
    pub const ALL: [Self; 4] = [Self::Small, Self::Medium, Self::Large, Self::Xlarge];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::Xlarge => "xlarge",
        }
    }

    /// 宽松解析（忽略大小写与首尾空白），无法识别时返回 `None`
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "small" => Some(Self::Small),
            "medium" => Some(Self::Medium),
            "large" => Some(Self::Large),
            "xlarge" => Some(Self::Xlarge),
            _ => None,
        }
    }

    /// 读取存储值：只接受规范的小写取值
    #[must_use]
    pub fn from_stored(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|size| size.as_str() == value)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Size {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| {
            DashboardError::validation_field(
                format!("unknown size '{s}', expected one of small, medium, large, xlarge"),
                "size",
            )
        })
    }
}

/// 蛋壳颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Brown,
    Other,
}

impl Color {
    /// 计数器中单独统计的颜色
    pub const TRACKED: [Self; 2] = [Self::White, Self::Brown];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Brown => "brown",
            Self::Other => "other",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "white" => Some(Self::White),
            "brown" => Some(Self::Brown),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    /// 读取存储值：只接受规范的小写取值
    #[must_use]
    pub fn from_stored(value: &str) -> Option<Self> {
        [Self::White, Self::Brown, Self::Other]
            .into_iter()
            .find(|color| color.as_str() == value)
    }

    #[must_use]
    pub const fn is_tracked(self) -> bool {
        matches!(self, Self::White | Self::Brown)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 品质判定
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Good,
    Bad,
}

impl Quality {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Bad => "bad",
        }
    }

    /// 解析存储中的品质：只有精确的 `"good"` 算合格，其余一律算不合格
    #[must_use]
    pub fn from_stored(value: Option<&str>) -> Self {
        match value {
            Some("good") => Self::Good,
            _ => Self::Bad,
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quality {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "good" => Ok(Self::Good),
            "bad" => Ok(Self::Bad),
            _ => Err(DashboardError::validation_field(
                format!("unknown quality '{s}', expected good or bad"),
                "quality",
            )),
        }
    }
}

/// 存储层的原始记录，所有字段都可能缺失
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEggRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl RawEggRecord {
    /// 从存储返回的 JSON 文档宽松读取记录
    ///
    /// 类型不符的字段按缺失处理，`confidence` 接受数字字符串。
    /// 只有文档本身不是对象时返回 `None`。
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        let fields = value.as_object()?;
        Some(Self {
            size: string_field(fields, "size"),
            color: string_field(fields, "color"),
            quality: string_field(fields, "quality"),
            confidence: fields.get("confidence").and_then(|v| match v {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            }),
            source: string_field(fields, "source"),
            timestamp: string_field(fields, "timestamp"),
        })
    }
}

fn string_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields.get(key).and_then(Value::as_str).map(str::to_string)
}

/// 一条已解析的分拣记录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EggRecord {
    pub id: String,
    pub size: Option<Size>,
    pub color: Option<Color>,
    pub quality: Quality,
    pub confidence: f64,
    pub source: String,
    pub timestamp: Option<DateTime<Utc>>,
}

impl EggRecord {
    /// 按默认值规则解析存储记录
    ///
    /// | 字段 | 缺失/异常时 |
    /// |------|-------------|
    /// | size / color | `None` |
    /// | quality | 非 `"good"` 即 `Bad` |
    /// | confidence | `0.0`，越界值截断到 `[0, 1]` |
    /// | source | [`DEFAULT_SOURCE`] |
    /// | timestamp | `None`，无偏移的时间按 UTC 处理 |
    #[must_use]
    pub fn from_raw(id: impl Into<String>, raw: RawEggRecord) -> Self {
        let confidence = raw
            .confidence
            .filter(|value| value.is_finite())
            .map_or(0.0, |value| value.clamp(0.0, 1.0));

        Self {
            id: id.into(),
            size: raw.size.as_deref().and_then(Size::from_stored),
            color: raw.color.as_deref().and_then(Color::from_stored),
            quality: Quality::from_stored(raw.quality.as_deref()),
            confidence,
            source: raw
                .source
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
            timestamp: raw
                .timestamp
                .as_deref()
                .and_then(timezone_utils::parse_record_timestamp),
        }
    }
}

/// 通过校验的尺寸/颜色/品质组合
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EggSpec {
    pub size: Size,
    pub color: Color,
    pub quality: Quality,
}

impl EggSpec {
    /// 校验写入请求中的三个枚举字段
    ///
    /// `other` 颜色仅在 `allow_other_color` 打开时接受。
    pub fn validate(size: &str, color: &str, quality: &str, allow_other_color: bool) -> Result<Self> {
        let size = size.parse::<Size>()?;
        let color = match Color::parse(color) {
            Some(Color::Other) if !allow_other_color => None,
            parsed => parsed,
        }
        .ok_or_else(|| {
            let expected = if allow_other_color {
                "white, brown or other"
            } else {
                "white or brown"
            };
            DashboardError::validation_field(
                format!("unknown color '{color}', expected {expected}"),
                "color",
            )
        })?;
        let quality = quality.parse::<Quality>()?;

        Ok(Self {
            size,
            color,
            quality,
        })
    }
}

/// 待写入存储的新记录（已校验，时间戳由服务端生成）
#[derive(Debug, Clone, PartialEq)]
pub struct NewEggRecord {
    pub spec: EggSpec,
    pub confidence: f64,
    pub source: String,
    pub timestamp: DateTime<Utc>,
}

impl NewEggRecord {
    /// 创建新记录，`confidence` 必须落在 `[0, 1]`
    ///
    /// 时间戳截断到微秒，与存储精度一致。
    pub fn new(
        spec: EggSpec,
        confidence: f64,
        source: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<Self> {
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(DashboardError::validation_field(
                format!("confidence {confidence} is outside [0, 1]"),
                "confidence",
            ));
        }
        let source = source.into();
        if source.trim().is_empty() {
            return Err(DashboardError::validation_field(
                "source must not be empty",
                "source",
            ));
        }

        Ok(Self {
            spec,
            confidence,
            source,
            timestamp: timestamp.trunc_subsecs(6),
        })
    }

    /// 转换为存储层的原始形态
    #[must_use]
    pub fn to_raw(&self) -> RawEggRecord {
        RawEggRecord {
            size: Some(self.spec.size.as_str().to_string()),
            color: Some(self.spec.color.as_str().to_string()),
            quality: Some(self.spec.quality.as_str().to_string()),
            confidence: Some(self.confidence),
            source: Some(self.source.clone()),
            timestamp: Some(timezone_utils::format_for_storage(&self.timestamp)),
        }
    }

    /// 附上存储分配的 id
    #[must_use]
    pub fn into_record(self, id: impl Into<String>) -> EggRecord {
        EggRecord {
            id: id.into(),
            size: Some(self.spec.size),
            color: Some(self.spec.color),
            quality: self.spec.quality,
            confidence: self.confidence,
            source: self.source,
            timestamp: Some(self.timestamp),
        }
    }
}
