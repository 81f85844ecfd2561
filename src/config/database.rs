//! # 数据库配置

use crate::error::{DashboardError, Result};
use crate::{
    linfo,
    logging::{LogComponent, LogStage},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// SQLite 数据库配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// 数据库URL
    pub url: String,
    /// 最大连接数
    pub max_connections: u32,
    /// 连接超时时间（秒）
    pub connect_timeout: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./data/egg_dashboard.db?mode=rwc".to_string(),
            max_connections: 5,
            connect_timeout: 30,
        }
    }
}

impl DatabaseConfig {
    /// 文件路径部分（去掉 scheme 与查询参数）
    fn file_path(&self) -> Option<&str> {
        if !self.is_sqlite() || self.is_memory_database() {
            return None;
        }
        let without_scheme = self
            .url
            .strip_prefix("sqlite://")
            .or_else(|| self.url.strip_prefix("sqlite:"))?;
        Some(without_scheme.split('?').next().unwrap_or(without_scheme))
    }

    /// 确保数据库路径存在（仅对SQLite文件数据库）
    pub fn ensure_database_path(&self) -> Result<()> {
        let Some(path_str) = self.file_path() else {
            return Ok(());
        };
        let db_path = Path::new(path_str);

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DashboardError::config_with_source(
                        format!("无法创建数据库目录: {}", parent.display()),
                        e,
                    )
                })?;

                linfo!(
                    "system",
                    LogStage::Startup,
                    LogComponent::Store,
                    "create_db_dir",
                    &format!("创建数据库目录: {}", parent.display())
                );
            }
        }

        if !db_path.exists() {
            linfo!(
                "system",
                LogStage::Startup,
                LogComponent::Store,
                "create_db_file_info",
                &format!("数据库文件将在首次连接时创建: {}", db_path.display())
            );
        }

        Ok(())
    }

    /// 获取准备好的数据库连接字符串
    pub fn get_connection_url(&self) -> Result<String> {
        self.ensure_database_path()?;
        Ok(self.url.clone())
    }

    /// 检查是否为内存数据库
    #[must_use]
    pub fn is_memory_database(&self) -> bool {
        self.url.contains(":memory:")
    }

    /// 检查是否为SQLite数据库
    #[must_use]
    pub fn is_sqlite(&self) -> bool {
        self.url.starts_with("sqlite:")
    }
}
