//! 报表窗口：按下界筛选记录、倒序排序、截断明细列表

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};
use crate::types::{EggRecord, timezone_utils};

/// 报表周期
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    /// 自本地当日零点起
    Daily,
    /// 最近 7×24 小时
    Weekly,
}

impl ReportPeriod {
    pub const ALL: [Self; 2] = [Self::Daily, Self::Weekly];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }

    /// 报表标题
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Daily => "Daily Egg Sorting Report",
            Self::Weekly => "Weekly Egg Sorting Report",
        }
    }

    /// 下载文件名 `<period>_report.pdf`
    #[must_use]
    pub fn filename(self) -> String {
        format!("{}_report.pdf", self.as_str())
    }

    /// 窗口下界（含）
    #[must_use]
    pub fn window_start(self, now: &DateTime<Utc>, offset: &FixedOffset) -> DateTime<Utc> {
        match self {
            Self::Daily => timezone_utils::local_day_start(now, offset),
            Self::Weekly => *now - Duration::days(7),
        }
    }
}

impl fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportPeriod {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            _ => Err(DashboardError::not_found("report period", s)),
        }
    }
}

/// 选出时间戳不早于 `start` 的记录，按时间倒序排列
///
/// 没有时间戳的记录不属于任何窗口。排序稳定：同一时刻的记录保持原有顺序。
#[must_use]
pub fn select_window<'a, I>(records: I, start: &DateTime<Utc>) -> Vec<&'a EggRecord>
where
    I: IntoIterator<Item = &'a EggRecord>,
{
    let mut selected: Vec<&EggRecord> = records
        .into_iter()
        .filter(|record| record.timestamp.is_some_and(|ts| ts >= *start))
        .collect();
    selected.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    selected
}

/// 带截断信息的明细列表
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Listing<T> {
    pub rows: Vec<T>,
    pub shown: usize,
    pub total: usize,
    pub truncated: bool,
}

impl<T> Listing<T> {
    /// 保留前 `max_rows` 行
    #[must_use]
    pub fn capped(mut rows: Vec<T>, max_rows: usize) -> Self {
        let total = rows.len();
        rows.truncate(max_rows);
        Self {
            shown: rows.len(),
            total,
            truncated: total > rows.len(),
            rows,
        }
    }

    /// 转换每一行，保留截断信息
    #[must_use]
    pub fn map<U, F>(self, f: F) -> Listing<U>
    where
        F: FnMut(T) -> U,
    {
        Listing {
            rows: self.rows.into_iter().map(f).collect(),
            shown: self.shown,
            total: self.total,
            truncated: self.truncated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::EggRecordFixture;
    use chrono::TimeZone;
    use rstest::rstest;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, h, m, 0).unwrap()
    }

    #[test]
    fn test_inclusive_lower_bound_and_newest_first() {
        let records = vec![
            EggRecordFixture::new().at(at(9, 59)).build("early"),
            EggRecordFixture::new().at(at(10, 0)).build("edge"),
            EggRecordFixture::new().at(at(12, 0)).build("late"),
            EggRecordFixture::new().no_timestamp().build("undated"),
        ];

        let ids: Vec<_> = select_window(&records, &at(10, 0))
            .into_iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["late", "edge"]);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let records = vec![
            EggRecordFixture::new().at(at(8, 0)).build("a"),
            EggRecordFixture::new().at(at(11, 0)).build("b"),
            EggRecordFixture::new().at(at(8, 0)).build("c"),
            EggRecordFixture::new().at(at(11, 0)).build("d"),
        ];

        let ids: Vec<_> = select_window(&records, &at(0, 0))
            .into_iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_listing_truncation() {
        let listing = Listing::capped((0..150).collect::<Vec<_>>(), 100);
        assert_eq!(listing.shown, 100);
        assert_eq!(listing.total, 150);
        assert!(listing.truncated);
        assert_eq!(listing.rows.first(), Some(&0));
        assert_eq!(listing.rows.last(), Some(&99));

        let small = Listing::capped(vec!['x'; 3], 100).map(|c| c.to_string());
        assert_eq!((small.shown, small.total, small.truncated), (3, 3, false));
    }

    #[test]
    fn test_daily_start_is_local_midnight() {
        let offset = timezone_utils::fixed_offset(8).unwrap();
        // 2024-01-01 20:00 UTC 已是本地 1 月 2 日
        let now = at(20, 0);
        assert_eq!(
            ReportPeriod::Daily.window_start(&now, &offset),
            at(16, 0)
        );
        assert_eq!(
            ReportPeriod::Weekly.window_start(&now, &offset),
            Utc.with_ymd_and_hms(2023, 12, 25, 20, 0, 0).unwrap()
        );
    }

    #[rstest]
    #[case("daily", ReportPeriod::Daily)]
    #[case("Weekly", ReportPeriod::Weekly)]
    fn test_period_parsing(#[case] input: &str, #[case] expected: ReportPeriod) {
        assert_eq!(input.parse::<ReportPeriod>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_period_is_not_found() {
        let err = "monthly".parse::<ReportPeriod>().unwrap_err();
        assert!(matches!(err, DashboardError::NotFound { .. }));
        assert_eq!(ReportPeriod::Weekly.filename(), "weekly_report.pdf");
    }
}
