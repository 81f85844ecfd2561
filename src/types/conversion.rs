use std::fmt;

#[derive(Debug)]
pub enum ConversionError {
    NegativeValue {
        field: String,
        value: i64,
    },
    Overflow {
        field: String,
    },
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NegativeValue { field, value } => {
                write!(f, "counter `{field}` expected non-negative value, got {value}")
            }
            Self::Overflow { field } => write!(f, "counter `{field}` overflowed target type"),
        }
    }
}

impl std::error::Error for ConversionError {}

/// 把存储中的有符号计数值转换为 `u64`，负值视为存储损坏
pub fn counter_from_i64(value: i64, field: &str) -> Result<u64, ConversionError> {
    if value < 0 {
        return Err(ConversionError::NegativeValue {
            field: field.to_string(),
            value,
        });
    }
    u64::try_from(value).map_err(|_| ConversionError::Overflow {
        field: field.to_string(),
    })
}

/// 把请求中的增量转换为存储使用的 `i64`
pub fn delta_to_i64(value: u64, field: &str) -> Result<i64, ConversionError> {
    i64::try_from(value).map_err(|_| ConversionError::Overflow {
        field: field.to_string(),
    })
}

/// Firebase 返回的 JSON 数字可能是整数也可能是浮点
#[must_use]
#[allow(clippy::cast_possible_truncation)] // 已确认是整数值
pub fn json_number_as_i64(value: &serde_json::Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|v| v.is_finite() && v.fract() == 0.0)
            .map(|v| v as i64)
    })
}

const F64_EXACT_INTEGER_MAX: u64 = 1u64 << f64::MANTISSA_DIGITS;

/// 将无符号整数比值转换为浮点表示。
/// 计数值通常远小于 `2^52`；超出时同时右移以保持比值稳定。
#[must_use]
pub fn ratio_as_f64(numerator: u64, denominator: u64) -> Option<f64> {
    if denominator == 0 {
        return None;
    }
    if numerator == 0 {
        return Some(0.0);
    }

    let mut num = numerator;
    let mut den = denominator;

    while num > F64_EXACT_INTEGER_MAX || den > F64_EXACT_INTEGER_MAX {
        num >>= 1;
        den >>= 1;
        if den == 0 {
            return None;
        }
    }

    #[allow(clippy::cast_precision_loss)] // 缩放后数值已位于安全范围内
    Some(num as f64 / den as f64)
}

/// 以百分比形式返回比值表示。
#[must_use]
pub fn ratio_as_percentage(numerator: u64, denominator: u64) -> f64 {
    ratio_as_f64(numerator, denominator).map_or(0.0, |ratio| ratio * 100.0)
}
