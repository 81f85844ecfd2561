//! # 时区转换类型和工具
//!
//! 存储中的时间戳一律归一化为 UTC（无偏移的字符串按 UTC 解释），
//! 报表展示时再转换到固定偏移（默认 UTC+8）。

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};

/// 默认展示偏移（小时）
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 8;

/// 把无时区的时间视为 UTC 的转换 Trait
pub trait AssumeUtc {
    /// 将本值解释为 UTC 时间
    fn assume_utc(&self) -> DateTime<Utc>;
}

impl AssumeUtc for NaiveDateTime {
    fn assume_utc(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_naive_utc_and_offset(*self, Utc)
    }
}

/// 时区工具函数
pub mod timezone_utils {
    use super::{AssumeUtc, DateTime, FixedOffset, NaiveDateTime, Utc};
    use chrono::{Duration, NaiveDate, NaiveTime, SecondsFormat};

    /// 根据小时数构造固定偏移，超出 ±14h 时返回 `None`
    #[must_use]
    pub fn fixed_offset(hours: i32) -> Option<FixedOffset> {
        if !(-14..=14).contains(&hours) {
            return None;
        }
        FixedOffset::east_opt(hours * 3600)
    }

    /// 解析存储中的 ISO-8601 时间戳
    ///
    /// 带偏移的字符串按其偏移换算；无偏移的字符串按 UTC 解释；
    /// 仅有日期时取当天 00:00 UTC。无法解析时返回 `None`。
    #[must_use]
    pub fn parse_record_timestamp(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }

        let offset_formats = ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];
        for format in &offset_formats {
            if let Ok(dt) = DateTime::parse_from_str(raw, format) {
                return Some(dt.with_timezone(&Utc));
            }
        }

        let naive_formats = [
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%dT%H:%M",
            "%Y-%m-%d %H:%M",
        ];
        for format in &naive_formats {
            if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
                return Some(dt.assume_utc());
            }
        }

        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .map(|date| date.and_time(NaiveTime::MIN).assume_utc())
    }

    /// 写入存储时使用的格式（RFC 3339，UTC，微秒精度）
    #[must_use]
    pub fn format_for_storage(dt: &DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    /// 报表展示格式 `YYYY-MM-DD HH:MM:SS`（本地偏移）
    #[must_use]
    pub fn format_for_display(dt: &DateTime<Utc>, offset: &FixedOffset) -> String {
        dt.with_timezone(offset)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }

    /// ISO 形式的本地时间 `YYYY-MM-DDTHH:MM:SS`（不带偏移后缀）
    #[must_use]
    pub fn format_local_iso(dt: &DateTime<Utc>, offset: &FixedOffset) -> String {
        dt.with_timezone(offset)
            .format("%Y-%m-%dT%H:%M:%S")
            .to_string()
    }

    /// 当前本地日 00:00:00.000 对应的 UTC 时刻
    #[must_use]
    pub fn local_day_start(now: &DateTime<Utc>, offset: &FixedOffset) -> DateTime<Utc> {
        let local_midnight = now.with_timezone(offset).date_naive().and_time(NaiveTime::MIN);
        (local_midnight - Duration::seconds(i64::from(offset.local_minus_utc()))).assume_utc()
    }
}

#[cfg(test)]
mod tests {
    use super::timezone_utils::*;
    use super::*;
    use chrono::TimeZone;

    fn ph() -> FixedOffset {
        fixed_offset(DEFAULT_UTC_OFFSET_HOURS).unwrap()
    }

    #[test]
    fn test_naive_timestamp_is_utc() {
        let parsed = parse_record_timestamp("2024-01-01T10:00:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap());
        assert_eq!(
            parsed,
            parse_record_timestamp("2024-01-01T10:00:00Z").unwrap()
        );
        assert_eq!(format_local_iso(&parsed, &ph()), "2024-01-01T18:00:00");
        assert_eq!(format_for_display(&parsed, &ph()), "2024-01-01 18:00:00");
    }

    #[test]
    fn test_offset_timestamps_are_normalised() {
        let fractional_utc = parse_record_timestamp("2024-05-01T08:30:00.123456+00:00").unwrap();
        let ph_iso = parse_record_timestamp("2024-05-01T16:30:00.123456+08:00").unwrap();
        assert_eq!(fractional_utc, ph_iso);

        let compact = parse_record_timestamp("2024-05-01T16:30:00+0800").unwrap();
        assert_eq!(compact.timestamp(), fractional_utc.timestamp());
    }

    #[test]
    fn test_other_accepted_shapes() {
        assert!(parse_record_timestamp("2024-01-01 10:00:00").is_some());
        assert!(parse_record_timestamp("2024-01-01 10:00:00.5").is_some());
        assert!(parse_record_timestamp("2024-01-01T10:00").is_some());
        assert_eq!(
            parse_record_timestamp("2024-01-01"),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
        assert!(parse_record_timestamp("yesterday").is_none());
        assert!(parse_record_timestamp("   ").is_none());
    }

    #[test]
    fn test_local_day_start_crosses_utc_date() {
        // 2024-01-01 20:00 UTC == 2024-01-02 04:00 (+08)
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 20, 0, 0).unwrap();
        let start = local_day_start(&now, &ph());
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 1, 1, 16, 0, 0).unwrap());
        assert_eq!(format_for_display(&start, &ph()), "2024-01-02 00:00:00");
    }

    #[test]
    fn test_local_day_start_same_utc_date() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let start = local_day_start(&now, &ph());
        assert_eq!(start, Utc.with_ymd_and_hms(2023, 12, 31, 16, 0, 0).unwrap());
    }

    #[test]
    fn test_fixed_offset_bounds() {
        assert!(fixed_offset(14).is_some());
        assert!(fixed_offset(-12).is_some());
        assert!(fixed_offset(15).is_none());
    }

    #[test]
    fn test_storage_format_round_trips() {
        let at = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap();
        let stored = format_for_storage(&at);
        assert_eq!(stored, "2024-02-29T23:59:59.000000Z");
        assert_eq!(parse_record_timestamp(&stored), Some(at));
    }
}
