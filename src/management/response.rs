//! # API 响应结构
//!
//! 成功响应直接返回 JSON 数据；失败统一为 `{error, code, timestamp}`。

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, ErrorCategory};
use crate::{
    lerror, lwarn,
    logging::{LogComponent, LogStage},
};

/// # 标准错误响应
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub pending_fields: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    #[must_use]
    pub fn from_error(error: &DashboardError) -> Self {
        let (_, code) = error.to_http_response_parts();
        let (field, pending_fields) = match error.root() {
            DashboardError::Validation { field, .. } => (field.clone(), Vec::new()),
            DashboardError::PartialReset { pending_fields, .. } => (None, pending_fields.clone()),
            _ => (None, Vec::new()),
        };
        Self {
            error: error.to_string(),
            code: code.to_string(),
            field,
            pending_fields,
            timestamp: Utc::now(),
        }
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let (status, code) = self.to_http_response_parts();
        match self.category() {
            ErrorCategory::Client => lwarn!(
                "api",
                LogStage::Request,
                LogComponent::Handler,
                "request_rejected",
                &self.to_string(),
                status = status.as_u16(),
                code = code
            ),
            ErrorCategory::Server => lerror!(
                "api",
                LogStage::Request,
                LogComponent::Handler,
                "request_failed",
                &self.to_string(),
                status = status.as_u16(),
                code = code
            ),
        }
        (status, Json(ErrorResponse::from_error(&self))).into_response()
    }
}

/// 请求体缺失或不是合法 JSON 时归为校验错误
impl From<JsonRejection> for DashboardError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(format!("invalid JSON body: {}", rejection.body_text()))
    }
}

/// # 便捷函数：指定状态码的 JSON 响应
pub fn json_with_status<T: Serialize>(status: StatusCode, data: T) -> Response {
    (status, Json(data)).into_response()
}

/// # 便捷函数：文件下载响应
pub fn attachment(content_type: &'static str, filename: &str, bytes: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}
