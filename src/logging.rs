//! # 日志配置模块
//!
//! 提供日志初始化以及带阶段/组件标签的结构化日志宏

use std::env;
use std::fmt;
use tracing_subscriber::{EnvFilter, fmt as tracing_fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// 日志所处的处理阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStage {
    Startup,
    Shutdown,
    Request,
    Db,
    ExternalApi,
    Aggregation,
    Reporting,
}

impl LogStage {
    /// 日志字段中使用的名称
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Shutdown => "shutdown",
            Self::Request => "request",
            Self::Db => "db",
            Self::ExternalApi => "external_api",
            Self::Aggregation => "aggregation",
            Self::Reporting => "reporting",
        }
    }
}

impl fmt::Display for LogStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 产生日志的组件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogComponent {
    Main,
    Config,
    ServerSetup,
    Handler,
    Store,
    Statistics,
    Report,
}

impl LogComponent {
    /// 日志字段中使用的名称
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Config => "config",
            Self::ServerSetup => "server_setup",
            Self::Handler => "handler",
            Self::Store => "store",
            Self::Statistics => "statistics",
            Self::Report => "report",
        }
    }
}

impl fmt::Display for LogComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 结构化 INFO 日志
///
/// 参数依次为: `request_id`, 阶段, 组件, 操作名, 描述, 以及可选的附加字段
#[macro_export]
macro_rules! linfo {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(, $($fields:tt)+)?) => {
        ::tracing::info!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($($fields)+ ,)?
            "{}",
            $message
        )
    };
}

/// 结构化 WARN 日志
#[macro_export]
macro_rules! lwarn {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(, $($fields:tt)+)?) => {
        ::tracing::warn!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($($fields)+ ,)?
            "{}",
            $message
        )
    };
}

/// 结构化 ERROR 日志
#[macro_export]
macro_rules! lerror {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(, $($fields:tt)+)?) => {
        ::tracing::error!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($($fields)+ ,)?
            "{}",
            $message
        )
    };
}

/// 结构化 DEBUG 日志
#[macro_export]
macro_rules! ldebug {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(, $($fields:tt)+)?) => {
        ::tracing::debug!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($($fields)+ ,)?
            "{}",
            $message
        )
    };
}

/// 默认的过滤规则：压低 sqlx/sea-orm 的查询日志
fn default_filter(level: &str) -> String {
    format!("{level},egg_dashboard=debug,sqlx::query=off,sqlx=warn,sea_orm=warn")
}

/// 初始化日志系统
///
/// 优先使用 `RUST_LOG`，否则按给定级别构建默认过滤规则。重复初始化时静默忽略。
pub fn init_logging(log_level: Option<&str>) {
    let level = log_level.unwrap_or("info");
    let log_filter = env::var("RUST_LOG").unwrap_or_else(|_| default_filter(level));

    let result = tracing_subscriber::registry()
        .with(EnvFilter::try_new(&log_filter).unwrap_or_else(|_| EnvFilter::new(default_filter("info"))))
        .with(
            tracing_fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();

    if result.is_ok() {
        tracing::debug!(filter = %log_filter, "logging initialised");
    }
}
