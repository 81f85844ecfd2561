//! 统计模块
//!
//! 计数聚合、报表窗口与分组汇总。除 [`counters`] 外均为纯函数。

pub mod aggregator;
pub mod counters;
pub mod summary;
pub mod window;

pub use aggregator::{CounterSnapshot, SizeHistogram, aggregate, counter_fields};
pub use counters::{CounterStrategy, IncrementalCounters, RecomputeCounters, build_strategy};
pub use summary::{SourceTotals, SummaryRow, summarize, source_totals};
pub use window::{Listing, ReportPeriod, select_window};
