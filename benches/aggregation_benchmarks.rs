//! # 聚合与报表性能基准测试
//!
//! 使用 Criterion 测量聚合、窗口筛选、汇总与 PDF 渲染

use std::hint::black_box;

use chrono::{DateTime, Duration, TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use egg_dashboard::config::ReportSettings;
use egg_dashboard::report::{PdfRenderer, ReportRenderer, build_report};
use egg_dashboard::statistics::{ReportPeriod, aggregate, select_window, summarize};
use egg_dashboard::types::{Color, EggRecord, Quality, Size};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 8, 4, 0, 0).unwrap()
}

/// 生成 `count` 条记录，每分钟一条，最新的在最后
fn records(count: usize) -> Vec<EggRecord> {
    let colors = [Color::White, Color::Brown, Color::Other];
    (0..count)
        .map(|i| EggRecord {
            id: format!("egg_{:08}", i + 1),
            size: Some(Size::ALL[i % Size::ALL.len()]),
            color: Some(colors[i % colors.len()]),
            quality: if i % 4 == 0 { Quality::Bad } else { Quality::Good },
            confidence: 0.9,
            source: if i % 5 == 0 { "manual" } else { "ai-sorter" }.to_string(),
            timestamp: Some(now() - Duration::minutes(i64::try_from(count - i).unwrap())),
        })
        .collect()
}

/// 聚合基准测试
fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");
    for size in [1_000, 10_000, 100_000] {
        let data = records(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| aggregate(black_box(data)));
        });
    }
    group.finish();
}

/// 窗口筛选与汇总基准测试
fn bench_window_and_summary(c: &mut Criterion) {
    let data = records(20_000);
    let start = now() - Duration::days(1);

    c.bench_function("select_window_20k", |b| {
        b.iter(|| select_window(black_box(&data), black_box(&start)).len());
    });

    let windowed = select_window(&data, &start);
    c.bench_function("summarize_window", |b| {
        b.iter(|| summarize(black_box(windowed.iter().copied())));
    });
}

/// 报表组装与 PDF 渲染基准测试
fn bench_report(c: &mut Criterion) {
    let data = records(10_000);
    let settings = ReportSettings::default();

    c.bench_function("build_weekly_report", |b| {
        b.iter(|| build_report(black_box(&data), ReportPeriod::Weekly, now(), &settings).unwrap());
    });

    let payload = build_report(&data, ReportPeriod::Weekly, now(), &settings).unwrap();
    let renderer = PdfRenderer::new();
    c.bench_function("render_weekly_pdf", |b| {
        b.iter(|| renderer.render(black_box(&payload)).unwrap().len());
    });
}

criterion_group!(benches, bench_aggregate, bench_window_and_summary, bench_report);
criterion_main!(benches);
