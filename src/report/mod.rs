//! # 报表模块
//!
//! 日报/周报数据组装与 PDF 渲染

pub mod builder;
pub mod pdf;

pub use builder::{ReportPayload, ReportRow, build_report, format_confidence};
pub use pdf::{PdfRenderer, ReportRenderer};
