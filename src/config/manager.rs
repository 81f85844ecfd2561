//! # 配置管理器
//!
//! 统一的配置加载入口：配置文件 + 环境变量覆盖 + 校验

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::AppConfig;
use crate::error::{DashboardError, Result};

/// 环境变量前缀
pub const ENV_PREFIX: &str = "EGG_DASHBOARD_";
/// 指定配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "EGG_DASHBOARD_CONFIG_PATH";

/// 配置管理器
#[derive(Debug, Clone)]
pub struct ConfigManager {
    /// 当前配置
    config: AppConfig,
    /// 实际使用的配置文件（不存在时为 `None`）
    source: Option<PathBuf>,
    /// 已应用的环境变量覆盖
    env_overrides: HashMap<String, String>,
}

impl ConfigManager {
    /// 从进程环境加载配置
    ///
    /// 配置文件路径优先级: `explicit_path` > `EGG_DASHBOARD_CONFIG_PATH` >
    /// `config/config.{RUST_ENV}.toml`
    pub fn new(explicit_path: Option<&Path>) -> Result<Self> {
        let vars: HashMap<String, String> = env::vars().collect();
        Self::from_env_map(explicit_path, &vars)
    }

    /// 以给定的环境变量表加载配置
    pub fn from_env_map(
        explicit_path: Option<&Path>,
        vars: &HashMap<String, String>,
    ) -> Result<Self> {
        let config_path = Self::resolve_config_path(explicit_path, vars);
        Self::from_file(&config_path, vars)
    }

    /// 从指定文件创建配置管理器，文件不存在时使用默认配置
    pub fn from_file(config_path: impl AsRef<Path>, vars: &HashMap<String, String>) -> Result<Self> {
        let config_path = config_path.as_ref();

        let (mut config, source) = match Self::load_config_file(config_path)? {
            Some(config) => (config, Some(config_path.to_path_buf())),
            None => {
                warn!("配置文件不存在: {}, 使用默认配置", config_path.display());
                (AppConfig::default(), None)
            }
        };

        let env_overrides = Self::build_env_overrides(vars);
        Self::apply_env_overrides(&mut config, &env_overrides)?;
        config.validate()?;

        info!("配置管理器初始化完成");
        info!(
            "- 配置文件: {}",
            source
                .as_ref()
                .map_or_else(|| "默认配置".to_string(), |p| p.display().to_string())
        );
        info!("- 存储后端: {}", config.store.backend);
        info!("- 计数策略: {}", config.store.counter_strategy);
        info!("- 环境变量覆盖: {} 个", env_overrides.len());

        Ok(Self {
            config,
            source,
            env_overrides,
        })
    }

    /// 获取当前配置
    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    /// 取出配置
    #[must_use]
    pub fn into_config(self) -> AppConfig {
        self.config
    }

    /// 实际加载的配置文件
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// 已应用的覆盖项数量
    #[must_use]
    pub fn override_count(&self) -> usize {
        self.env_overrides.len()
    }

    /// 计算配置文件路径
    #[must_use]
    pub fn resolve_config_path(
        explicit_path: Option<&Path>,
        vars: &HashMap<String, String>,
    ) -> PathBuf {
        if let Some(path) = explicit_path {
            return path.to_path_buf();
        }
        if let Some(path) = vars.get(CONFIG_PATH_ENV).filter(|p| !p.trim().is_empty()) {
            return PathBuf::from(path);
        }
        let env = vars.get("RUST_ENV").map_or("dev", String::as_str);
        PathBuf::from(format!("config/config.{env}.toml"))
    }

    /// 加载配置文件
    fn load_config_file(path: &Path) -> Result<Option<AppConfig>> {
        if !path.exists() {
            return Ok(None);
        }

        let config_content = std::fs::read_to_string(path).map_err(|e| {
            DashboardError::config_with_source(format!("读取配置文件失败: {}", path.display()), e)
        })?;

        let config: AppConfig = toml::from_str(&config_content).map_err(|e| {
            DashboardError::config_with_source(
                format!("TOML解析失败 - 配置文件: {}, 详细错误: {e}", path.display()),
                e,
            )
        })?;

        Ok(Some(config))
    }

    /// 构建环境变量覆盖映射
    ///
    /// 例如: `EGG_DASHBOARD_COUNTER_STRATEGY` -> `counter_strategy`
    #[must_use]
    pub fn build_env_overrides(vars: &HashMap<String, String>) -> HashMap<String, String> {
        let overrides: HashMap<String, String> = vars
            .iter()
            .filter(|(key, _)| key.as_str() != CONFIG_PATH_ENV)
            .filter_map(|(key, value)| {
                key.strip_prefix(ENV_PREFIX)
                    .map(|config_key| (config_key.to_ascii_lowercase(), value.clone()))
            })
            .collect();

        debug!("发现 {} 个环境变量覆盖", overrides.len());
        overrides
    }

    /// 应用环境变量覆盖
    pub fn apply_env_overrides(
        config: &mut AppConfig,
        overrides: &HashMap<String, String>,
    ) -> Result<()> {
        for (key, value) in overrides {
            debug!(
                "应用环境变量覆盖: {} = {}",
                key,
                if key.contains("token") { "***" } else { value }
            );

            Self::apply_override_to_config(config, key, value)?;
        }
        Ok(())
    }

    /// 将单个覆盖项应用到配置对象
    fn apply_override_to_config(config: &mut AppConfig, key: &str, value: &str) -> Result<()> {
        match key {
            "port" => {
                config.server.port = value.parse().map_err(|e| {
                    DashboardError::config_with_source(format!("无效的端口号: {value}"), e)
                })?;
            }
            "bind" => config.server.bind = value.to_string(),
            "store" => config.store.backend = value.parse()?,
            "counter_strategy" => config.store.counter_strategy = value.parse()?,
            "database_url" => config.store.sqlite.url = value.to_string(),
            "firebase_url" => config.store.firebase.database_url = value.to_string(),
            "firebase_token" => {
                config.store.firebase.auth_token =
                    Some(value.to_string()).filter(|token| !token.is_empty());
            }
            "static_dir" => {
                config.server.static_dir = Some(value.to_string()).filter(|dir| !dir.is_empty());
            }
            _ => {
                warn!("未知的配置项，忽略环境变量覆盖: {}{}", ENV_PREFIX, key.to_ascii_uppercase());
            }
        }

        Ok(())
    }
}
