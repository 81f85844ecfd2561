//! # 系统信息处理器

use axum::Json;
use axum::extract::State;

use crate::error::Result;
use crate::management::server::AppState;
use crate::management::services::eggs::HealthStatus;

/// 根路径处理器（未配置静态页面时）
pub async fn root_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Egg Dashboard API",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Ping 处理器
pub async fn ping_handler() -> &'static str {
    "pong"
}

/// 健康检查：存储可达时返回 200，否则 503
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthStatus>> {
    Ok(Json(state.health().await?))
}
