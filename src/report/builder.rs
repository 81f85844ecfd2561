//! 报表数据组装
//!
//! 从全部记录中选出窗口内的记录，计算窗口合计、分组汇总、来源统计，
//! 并生成按本地时间展示的明细行。JSON 报表接口与 PDF 渲染共用同一份数据。

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::ReportSettings;
use crate::error::Result;
use crate::statistics::{
    CounterSnapshot, Listing, ReportPeriod, SourceTotals, SummaryRow, aggregate, select_window,
    source_totals, summarize,
};
use crate::types::{EggRecord, timezone_utils};

/// 缺失尺寸/颜色时的展示文本
const MISSING: &str = "-";

/// 明细表的一行（全部为展示字符串）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub id: String,
    /// 本地时间 `YYYY-MM-DD HH:MM:SS`
    pub time: String,
    pub size: String,
    pub color: String,
    pub quality: String,
    /// 百分比，保留一位小数，如 `97.5%`
    pub confidence: String,
    pub source: String,
}

impl ReportRow {
    fn from_record(record: &EggRecord, offset: &chrono::FixedOffset) -> Self {
        Self {
            id: record.id.clone(),
            time: record
                .timestamp
                .as_ref()
                .map_or_else(String::new, |ts| timezone_utils::format_for_display(ts, offset)),
            size: record
                .size
                .map_or(MISSING, |size| size.as_str())
                .to_string(),
            color: record
                .color
                .map_or(MISSING, |color| color.as_str())
                .to_string(),
            quality: record.quality.as_str().to_string(),
            confidence: format_confidence(record.confidence),
            source: record.source.clone(),
        }
    }
}

/// 报表数据
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportPayload {
    pub period: ReportPeriod,
    pub title: String,
    /// 生成时间（本地展示格式）
    pub generated_at: String,
    /// 窗口下界（UTC）
    pub window_start: DateTime<Utc>,
    /// 窗口下界（本地展示格式）
    pub window_start_local: String,
    pub utc_offset_hours: i32,
    /// 整个窗口的合计，不受明细截断影响
    pub totals: CounterSnapshot,
    pub summary: Vec<SummaryRow>,
    pub sources: SourceTotals,
    pub listing: Listing<ReportRow>,
}

/// 置信度展示格式
#[must_use]
pub fn format_confidence(confidence: f64) -> String {
    format!("{:.1}%", confidence * 100.0)
}

/// 组装指定周期的报表
pub fn build_report(
    records: &[EggRecord],
    period: ReportPeriod,
    now: DateTime<Utc>,
    settings: &ReportSettings,
) -> Result<ReportPayload> {
    let offset = settings.offset()?;
    let window_start = period.window_start(&now, &offset);
    let windowed = select_window(records, &window_start);

    let totals = aggregate(windowed.iter().copied());
    let summary = summarize(windowed.iter().copied());
    let sources = source_totals(windowed.iter().copied(), &settings.automated_sources);
    let listing = Listing::capped(windowed, settings.max_rows)
        .map(|record| ReportRow::from_record(record, &offset));

    Ok(ReportPayload {
        period,
        title: period.title().to_string(),
        generated_at: timezone_utils::format_for_display(&now, &offset),
        window_start,
        window_start_local: timezone_utils::format_for_display(&window_start, &offset),
        utc_offset_hours: settings.utc_offset_hours,
        totals,
        summary,
        sources,
        listing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::{EggRecordFixture, fixed_now};
    use crate::types::{Color, Size};
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_truncated_listing_keeps_full_totals() {
        let now = fixed_now();
        let records: Vec<_> = (0..150)
            .map(|i| {
                EggRecordFixture::new()
                    .at(now - Duration::seconds(i))
                    .build(&format!("egg_{i:03}"))
            })
            .collect();

        let report =
            build_report(&records, ReportPeriod::Weekly, now, &ReportSettings::default()).unwrap();

        assert_eq!(report.listing.shown, 100);
        assert_eq!(report.listing.total, 150);
        assert!(report.listing.truncated);
        assert_eq!(report.totals.total, 150);
        assert_eq!(report.summary.iter().map(|row| row.count).sum::<u64>(), 150);
        assert_eq!(report.sources.total, 150);
        // 最新的在前
        assert_eq!(report.listing.rows[0].id, "egg_000");
    }

    #[test]
    fn test_daily_window_uses_local_midnight() {
        // 2024-01-02 04:00 UTC = 本地 12:00，窗口从 2024-01-01 16:00 UTC 开始
        let now = fixed_now();
        let records = vec![
            EggRecordFixture::new()
                .at(Utc.with_ymd_and_hms(2024, 1, 1, 15, 59, 59).unwrap())
                .build("yesterday"),
            EggRecordFixture::new()
                .at(Utc.with_ymd_and_hms(2024, 1, 1, 16, 0, 0).unwrap())
                .build("midnight"),
            EggRecordFixture::new().no_timestamp().build("undated"),
        ];

        let report =
            build_report(&records, ReportPeriod::Daily, now, &ReportSettings::default()).unwrap();

        assert_eq!(report.window_start_local, "2024-01-02 00:00:00");
        assert_eq!(report.generated_at, "2024-01-02 12:00:00");
        assert_eq!(report.totals.total, 1);
        assert_eq!(report.listing.rows[0].id, "midnight");
        assert_eq!(report.listing.rows[0].time, "2024-01-02 00:00:00");
    }

    #[test]
    fn test_row_formatting() {
        let now = fixed_now();
        let records = vec![
            EggRecordFixture::new()
                .size(Size::Xlarge)
                .color(Color::Brown)
                .bad()
                .confidence(0.975)
                .source("manual")
                .at(now)
                .build("1"),
            EggRecordFixture::new().no_size().no_color().at(now).build("2"),
        ];

        let report =
            build_report(&records, ReportPeriod::Daily, now, &ReportSettings::default()).unwrap();
        let first = &report.listing.rows[0];
        assert_eq!(
            (
                first.size.as_str(),
                first.color.as_str(),
                first.quality.as_str(),
                first.confidence.as_str(),
                first.source.as_str()
            ),
            ("xlarge", "brown", "bad", "97.5%", "manual")
        );
        assert_eq!(report.listing.rows[1].size, "-");
        assert_eq!(report.sources.manual, 1);
    }

    #[test]
    fn test_invalid_offset_is_rejected() {
        let settings = ReportSettings {
            utc_offset_hours: 20,
            ..ReportSettings::default()
        };
        assert!(build_report(&[], ReportPeriod::Daily, fixed_now(), &settings).is_err());
    }

    #[test]
    fn test_confidence_format() {
        assert_eq!(format_confidence(1.0), "100.0%");
        assert_eq!(format_confidence(0.0), "0.0%");
        assert_eq!(format_confidence(0.5), "50.0%");
    }
}
