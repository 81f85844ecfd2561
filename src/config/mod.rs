//! # 配置管理模块
//!
//! 处理应用配置加载、验证和管理

mod app_config;
mod database;
mod manager;

pub use app_config::{
    AppConfig, CounterStrategyKind, FirebaseConfig, ReportSettings, ServerConfig, StoreBackend,
    StoreConfig,
};
pub use database::DatabaseConfig;
pub use manager::{CONFIG_PATH_ENV, ConfigManager, ENV_PREFIX};

use std::path::Path;

/// 从进程环境加载并校验配置
pub fn load_config(explicit_path: Option<&Path>) -> crate::error::Result<AppConfig> {
    ConfigManager::new(explicit_path).map(ConfigManager::into_config)
}
