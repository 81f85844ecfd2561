//! # 统一错误处理
//!
//! 所有失败在跨越 HTTP 边界之前都归类为 [`DashboardError`]

use std::fmt::Display;

pub mod types;

pub use types::DashboardError;

/// 全局 `Result` 别名
pub type Result<T> = std::result::Result<T, DashboardError>;

/// 为任意可转换为 [`DashboardError`] 的错误附加上下文
pub trait Context<T> {
    #[track_caller]
    fn context<C: Display>(self, context: C) -> Result<T>;

    #[track_caller]
    fn with_context<C, F>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display;
}

impl<T, E> Context<T> for std::result::Result<T, E>
where
    E: Into<DashboardError>,
{
    fn context<C: Display>(self, context: C) -> Result<T> {
        self.with_context(|| context)
    }

    fn with_context<C, F>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display,
    {
        self.map_err(|error| DashboardError::Context {
            context: context().to_string(),
            source: Box::new(error.into()),
        })
    }
}

/// 直接构造带上下文的失败结果
pub fn context_error<T>(err: impl Into<DashboardError>, context: impl Display) -> Result<T> {
    Err(err.into()).context(context)
}

/// 错误归属，决定日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// 4xx：请求本身有问题
    Client,
    /// 5xx：服务或存储侧故障
    Server,
}
