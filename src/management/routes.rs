//! # 路由配置
//!
//! 定义所有API路由和路由组织

use axum::Router;
use axum::routing::{get, post};

use crate::management::handlers::{eggs, reports, system};
use crate::management::server::AppState;

/// 创建所有路由
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_routes())
        // PDF 下载，`/pdf/*` 为旧路径
        .route("/report/{period}", get(reports::download_report))
        .route("/pdf/{period}", get(reports::download_report))
        .route("/ping", get(system::ping_handler))
        .with_state(state)
}

/// JSON API 路由
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/data", get(eggs::get_dashboard))
        .route("/stats", get(eggs::get_dashboard))
        .route("/manual-add", post(eggs::manual_add))
        .route("/manual_add", post(eggs::manual_add))
        .route("/egg", post(eggs::record_egg))
        .route("/reset", post(eggs::reset))
        .route("/report/{period}", get(reports::get_report))
        .route("/health", get(system::health_check))
}
