//! # 错误类型定义

use axum::http::StatusCode;
use thiserror::Error;

use super::ErrorCategory;

/// 应用主要错误类型
#[derive(Debug, Error)]
pub enum DashboardError {
    /// 输入校验失败（未知尺寸/颜色/品质、数量越界、请求体缺失）
    #[error("校验错误: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// 存储不可达、超时或返回了无法解析的数据
    #[error("存储不可用: {message}")]
    StoreUnavailable {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 重置只完成了一部分：记录已删除但部分计数字段未清零
    #[error("部分重置失败: {message} (未清零字段: {})", .pending_fields.join(", "))]
    PartialReset {
        message: String,
        pending_fields: Vec<String>,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 请求的资源不存在
    #[error("资源未找到: {resource_type} {identifier}")]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    /// 配置相关错误
    #[error("配置错误: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 报表渲染错误
    #[error("报表渲染错误: {message}")]
    Render { message: String },

    /// 序列化/反序列化错误
    #[error("序列化错误: {message}")]
    Serialization {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    /// IO相关错误
    #[error("IO错误: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// 系统内部错误
    #[error("内部错误: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 附加上下文的错误
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<DashboardError>,
    },
}

impl DashboardError {
    /// 将错误转换为HTTP状态码和错误代码
    #[must_use]
    pub fn to_http_response_parts(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::StoreUnavailable { .. } => (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE"),
            Self::PartialReset { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "PARTIAL_RESET"),
            Self::NotFound { .. } => (StatusCode::NOT_FOUND, "RESOURCE_NOT_FOUND"),
            Self::Config { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            Self::Render { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "RENDER_ERROR"),
            Self::Serialization { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "SERIALIZATION_ERROR"),
            Self::Io { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
            Self::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::Context { source, .. } => source.to_http_response_parts(),
        }
    }

    /// 错误归属：客户端 (4xx) 或服务端 (5xx)
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        if self.to_http_response_parts().0.is_client_error() {
            ErrorCategory::Client
        } else {
            ErrorCategory::Server
        }
    }

    /// 去掉上下文包装后的根错误
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// 创建校验错误
    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// 创建指向具体字段的校验错误
    pub fn validation_field<T: Into<String>, F: Into<String>>(message: T, field: F) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// 创建存储不可用错误
    pub fn store_unavailable<T: Into<String>>(message: T) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的存储不可用错误
    pub fn store_unavailable_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建部分重置错误
    pub fn partial_reset<T: Into<String>>(
        message: T,
        pending_fields: Vec<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::PartialReset {
            message: message.into(),
            pending_fields,
            source,
        }
    }

    /// 创建资源未找到错误
    pub fn not_found<T: Into<String>, I: Into<String>>(resource_type: T, identifier: I) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            identifier: identifier.into(),
        }
    }

    /// 创建配置错误
    pub fn config<T: Into<String>>(message: T) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的配置错误
    pub fn config_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建报表渲染错误
    pub fn render<T: Into<String>>(message: T) -> Self {
        Self::Render {
            message: message.into(),
        }
    }

    /// 创建内部错误
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的内部错误
    pub fn internal_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

// 自动转换常见错误类型
impl From<std::io::Error> for DashboardError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: "文件操作失败".to_string(),
            source: err,
        }
    }
}

impl From<toml::de::Error> for DashboardError {
    fn from(err: toml::de::Error) -> Self {
        Self::config_with_source("TOML解析失败", err)
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: "JSON处理失败".to_string(),
            source: err.into(),
        }
    }
}

// 数据库错误一律视为存储不可用
impl From<sea_orm::error::DbErr> for DashboardError {
    fn from(err: sea_orm::error::DbErr) -> Self {
        Self::store_unavailable_with_source("数据库操作失败", err)
    }
}

impl From<reqwest::Error> for DashboardError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "远程存储请求超时"
        } else if err.is_connect() {
            "无法连接远程存储"
        } else if err.is_decode() {
            "远程存储返回了无法解析的数据"
        } else {
            "远程存储请求失败"
        };
        Self::store_unavailable_with_source(message, err)
    }
}
