//! # 服务层
//!
//! 业务逻辑，供 HTTP handler 与其它入口复用

pub mod eggs;

pub use eggs::{
    DashboardCounters, DashboardView, EggService, HealthStatus, ManualAddOutcome,
    QualityBreakdown, RecentRecord, RenderedReport, ResetOutcome, parse_quantity,
};
