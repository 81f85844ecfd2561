//! # 报表处理器

use axum::Json;
use axum::extract::{Path, State};
use axum::response::Response;

use crate::error::Result;
use crate::management::response;
use crate::management::server::AppState;
use crate::report::ReportPayload;
use crate::statistics::ReportPeriod;

/// JSON 报表，未知周期返回 404
pub async fn get_report(
    State(state): State<AppState>,
    Path(period): Path<String>,
) -> Result<Json<ReportPayload>> {
    let period = period.parse::<ReportPeriod>()?;
    Ok(Json(state.report(period).await?))
}

/// PDF 报表下载
pub async fn download_report(
    State(state): State<AppState>,
    Path(period): Path<String>,
) -> Result<Response> {
    let period = period.parse::<ReportPeriod>()?;
    let rendered = state.render_report(period).await?;
    Ok(response::attachment(
        rendered.content_type,
        &rendered.filename,
        rendered.bytes,
    ))
}
