//! # Egg Dashboard Library
//!
//! 鸡蛋分拣看板核心库：记录存储、计数聚合、日报/周报窗口与报表渲染

pub mod config;
pub mod error;
pub mod logging;
pub mod management;
pub mod report;
pub mod statistics;
pub mod store;
pub mod testing;
pub mod types;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{DashboardError, Result};
