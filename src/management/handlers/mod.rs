//! # HTTP 处理器

pub mod eggs;
pub mod reports;
pub mod system;
