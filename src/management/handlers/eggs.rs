//! # 分拣记录处理器

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::Response;
use serde::Deserialize;
use serde_json::Value;

use crate::error::Result;
use crate::management::response;
use crate::management::server::AppState;
use crate::management::services::eggs::{DashboardView, ResetOutcome, parse_quantity};
use crate::types::WEB_DASHBOARD_SOURCE;

/// 手动录入请求
#[derive(Debug, Deserialize)]
pub struct ManualAddRequest {
    pub size: String,
    pub color: String,
    pub quality: String,
    /// 数字或数字字符串，缺省为 1
    #[serde(default)]
    pub qty: Option<Value>,
}

/// 分拣设备上报请求
#[derive(Debug, Deserialize)]
pub struct RecordEggRequest {
    pub size: String,
    pub color: String,
    pub quality: String,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub source: Option<String>,
}

/// 看板数据
pub async fn get_dashboard(State(state): State<AppState>) -> Result<Json<DashboardView>> {
    Ok(Json(state.dashboard().await?))
}

/// 手动批量录入
pub async fn manual_add(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ManualAddRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(request) = payload?;
    let qty = parse_quantity(request.qty.as_ref())?;
    let outcome = state
        .manual_add(&request.size, &request.color, &request.quality, qty)
        .await?;
    Ok(response::json_with_status(StatusCode::CREATED, outcome))
}

/// 写入单条分拣记录
pub async fn record_egg(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RecordEggRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(request) = payload?;
    let source = request
        .source
        .as_deref()
        .filter(|source| !source.trim().is_empty())
        .unwrap_or(WEB_DASHBOARD_SOURCE);
    let record = state
        .record_egg(
            &request.size,
            &request.color,
            &request.quality,
            request.confidence.unwrap_or(1.0),
            source,
        )
        .await?;
    Ok(response::json_with_status(StatusCode::CREATED, record))
}

/// 删除全部记录并清零计数
pub async fn reset(State(state): State<AppState>) -> Result<Json<ResetOutcome>> {
    Ok(Json(state.reset_all().await?))
}
