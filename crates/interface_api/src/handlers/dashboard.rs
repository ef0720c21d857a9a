//! Dashboard and report handlers

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use domain_cases::CaseSummary;

use crate::{error::ApiError, AppState};

/// Totals, resolution rate, and counts by department and status
pub async fn dashboard(State(state): State<AppState>) -> Result<Json<CaseSummary>, ApiError> {
    Ok(Json(state.workflow.store().summary().await?))
}

/// Every case as a CSV download
pub async fn export_report(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let cases = state.workflow.store().all().await?;
    let body = infra_store::export_csv(&cases)?;
    let filename = format!(
        "attachment; filename=\"claim_report_{}.csv\"",
        Utc::now().format("%Y%m%d")
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, filename),
        ],
        body,
    ))
}
