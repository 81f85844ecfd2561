//! # 应用配置结构定义

use std::fmt;
use std::str::FromStr;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use super::DatabaseConfig;
use crate::error::{DashboardError, Result};
use crate::types::timezone::{DEFAULT_UTC_OFFSET_HOURS, timezone_utils};

/// 应用主配置结构
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP 服务配置
    #[serde(default)]
    pub server: ServerConfig,
    /// 存储后端配置
    #[serde(default)]
    pub store: StoreConfig,
    /// 报表与看板配置
    #[serde(default)]
    pub report: ReportSettings,
}

/// HTTP 服务配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 监听地址
    pub bind: String,
    /// 监听端口
    pub port: u16,
    /// 是否启用 CORS
    pub enable_cors: bool,
    /// 允许的跨域来源，为空时允许任意来源
    pub cors_origins: Vec<String>,
    /// 看板静态页面目录
    pub static_dir: Option<String>,
    /// 请求体大小上限（字节）
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 5000,
            enable_cors: true,
            cors_origins: Vec::new(),
            static_dir: Some("static".to_string()),
            body_limit_bytes: 64 * 1024,
        }
    }
}

/// 存储后端类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// 进程内存（重启后丢失）
    #[default]
    Memory,
    /// 本地 SQLite 数据库
    Sqlite,
    /// Firebase Realtime Database REST 接口
    Firebase,
}

impl StoreBackend {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Sqlite => "sqlite",
            Self::Firebase => "firebase",
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreBackend {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            "firebase" => Ok(Self::Firebase),
            other => Err(DashboardError::config(format!(
                "未知的存储后端: {other} (可选 memory, sqlite, firebase)"
            ))),
        }
    }
}

/// 计数器维护策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterStrategyKind {
    /// 每次读取时扫描全部记录重新计算
    #[default]
    Recompute,
    /// 写入时按字段原子自增
    Incremental,
}

impl CounterStrategyKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Recompute => "recompute",
            Self::Incremental => "incremental",
        }
    }
}

impl fmt::Display for CounterStrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CounterStrategyKind {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recompute" => Ok(Self::Recompute),
            "incremental" => Ok(Self::Incremental),
            other => Err(DashboardError::config(format!(
                "未知的计数策略: {other} (可选 recompute, incremental)"
            ))),
        }
    }
}

/// 存储配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// 后端类型
    pub backend: StoreBackend,
    /// 计数策略
    pub counter_strategy: CounterStrategyKind,
    /// SQLite 配置
    pub sqlite: DatabaseConfig,
    /// Firebase 配置
    pub firebase: FirebaseConfig,
}

/// Firebase Realtime Database 配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirebaseConfig {
    /// 数据库根地址，例如 `https://project-default-rtdb.firebaseio.com`
    pub database_url: String,
    /// 数据库密钥或 ID token，作为 `auth` 查询参数发送
    pub auth_token: Option<String>,
    /// 记录集合路径
    pub records_path: String,
    /// 计数器路径
    pub counters_path: String,
    /// 请求超时（秒）
    pub timeout_seconds: u64,
}

impl Default for FirebaseConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            auth_token: None,
            records_path: "records".to_string(),
            counters_path: "counters".to_string(),
            timeout_seconds: 10,
        }
    }
}

/// 报表与看板配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// 报表展示使用的固定 UTC 偏移（小时）
    pub utc_offset_hours: i32,
    /// 明细列表最大行数
    pub max_rows: usize,
    /// 看板最近记录条数
    pub recent_limit: usize,
    /// 计入"自动分拣"的来源标签
    pub automated_sources: Vec<String>,
    /// 是否接受 `other` 颜色
    pub allow_other_color: bool,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
            max_rows: 100,
            recent_limit: 10,
            automated_sources: vec!["ai-sorter".to_string(), "sequential-sorter".to_string()],
            allow_other_color: false,
        }
    }
}

impl ReportSettings {
    /// 展示用的固定偏移
    pub fn offset(&self) -> Result<FixedOffset> {
        timezone_utils::fixed_offset(self.utc_offset_hours).ok_or_else(|| {
            DashboardError::config(format!(
                "无效的 UTC 偏移: {} 小时 (允许 -14..=14)",
                self.utc_offset_hours
            ))
        })
    }
}

impl AppConfig {
    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(DashboardError::config("无效的服务器端口: 0"));
        }
        if self.server.bind.trim().is_empty() {
            return Err(DashboardError::config("监听地址不能为空"));
        }
        if self.server.body_limit_bytes == 0 {
            return Err(DashboardError::config("请求体大小上限必须大于0"));
        }

        match self.store.backend {
            StoreBackend::Memory => {}
            StoreBackend::Sqlite => {
                if self.store.sqlite.url.trim().is_empty() {
                    return Err(DashboardError::config("数据库URL不能为空"));
                }
                if self.store.sqlite.max_connections == 0 {
                    return Err(DashboardError::config("数据库最大连接数必须大于0"));
                }
            }
            StoreBackend::Firebase => {
                let firebase = &self.store.firebase;
                if firebase.database_url.trim().is_empty() {
                    return Err(DashboardError::config("Firebase 数据库URL不能为空"));
                }
                if !firebase.database_url.starts_with("http://")
                    && !firebase.database_url.starts_with("https://")
                {
                    return Err(DashboardError::config(format!(
                        "Firebase 数据库URL必须以 http:// 或 https:// 开头: {}",
                        firebase.database_url
                    )));
                }
                if firebase.records_path.trim_matches('/').is_empty()
                    || firebase.counters_path.trim_matches('/').is_empty()
                {
                    return Err(DashboardError::config("Firebase 记录/计数路径不能为空"));
                }
                if firebase.timeout_seconds == 0 {
                    return Err(DashboardError::config("Firebase 请求超时必须大于0"));
                }
            }
        }

        self.report.offset()?;
        if self.report.max_rows == 0 {
            return Err(DashboardError::config("report.max_rows 必须大于0"));
        }
        if self.report.recent_limit == 0 {
            return Err(DashboardError::config("report.recent_limit 必须大于0"));
        }

        Ok(())
    }

    /// 服务监听地址 `bind:port`
    #[must_use]
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.server.bind, self.server.port)
    }
}
