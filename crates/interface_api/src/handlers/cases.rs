//! Case handlers
//!
//! Every handler acts as the department resolved by the auth middleware.

use std::str::FromStr;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use domain_cases::{Department, FinalDecision, Role};
use validator::Validate;

use crate::dto::cases::*;
use crate::{error::ApiError, AppState};

/// Submits a complaint and opens a case
pub async fn submit_case(
    State(state): State<AppState>,
    Json(request): Json<SubmitCaseRequest>,
) -> Result<(StatusCode, Json<CaseResponse>), ApiError> {
    request.validate()?;

    let case = state.workflow.submit(&request.lot_id, &request.complaint).await?;
    let response = CaseResponse::new(&case, state.workflow.state_of(&case));
    Ok((StatusCode::CREATED, Json(response)))
}

/// Latest case for a lot
pub async fn track_case(
    State(state): State<AppState>,
    Path(lot_id): Path<String>,
) -> Result<Json<CaseResponse>, ApiError> {
    let case = state
        .workflow
        .store()
        .find_latest(&lot_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No case for lot {}", lot_id)))?;
    Ok(Json(CaseResponse::new(&case, state.workflow.state_of(&case))))
}

/// Cases waiting on the caller's department
pub async fn list_pending(
    State(state): State<AppState>,
    Extension(role): Extension<Role>,
) -> Result<Json<Vec<CaseResponse>>, ApiError> {
    let cases = state.workflow.pending_for(&role).await?;
    Ok(Json(responses(&state, &cases)))
}

pub async fn list_closed(
    State(state): State<AppState>,
) -> Result<Json<Vec<CaseResponse>>, ApiError> {
    let cases = state.workflow.store().list_closed().await?;
    Ok(Json(responses(&state, &cases)))
}

/// Records investigation findings and forwards to the decision department
pub async fn forward_case(
    State(state): State<AppState>,
    Extension(role): Extension<Role>,
    Path(lot_id): Path<String>,
    body: Option<Json<ForwardRequest>>,
) -> Result<Json<CaseResponse>, ApiError> {
    let Json(request) = body.unwrap_or_default();
    request.validate()?;

    let case = state
        .workflow
        .investigate_and_forward(&role, &lot_id, &request.note)
        .await?;
    Ok(Json(CaseResponse::new(&case, state.workflow.state_of(&case))))
}

/// Closes a case with a final decision
pub async fn close_case(
    State(state): State<AppState>,
    Extension(role): Extension<Role>,
    Path(lot_id): Path<String>,
    Json(request): Json<CloseRequest>,
) -> Result<Json<CaseResponse>, ApiError> {
    request.validate()?;
    let decision = FinalDecision::from_str(&request.decision)?;

    let case = state
        .workflow
        .close(&role, &lot_id, decision, &request.customer_note)
        .await?;
    Ok(Json(CaseResponse::new(&case, state.workflow.state_of(&case))))
}

/// Moves a case to another department
pub async fn reassign_case(
    State(state): State<AppState>,
    Extension(role): Extension<Role>,
    Path(lot_id): Path<String>,
    Json(request): Json<ReassignRequest>,
) -> Result<Json<CaseResponse>, ApiError> {
    request.validate()?;
    let department = Department::new(&request.department)?;

    let case = state
        .workflow
        .override_reassign(&role, &lot_id, &department)
        .await?;
    Ok(Json(CaseResponse::new(&case, state.workflow.state_of(&case))))
}

/// What the caller may do to the latest case for a lot
pub async fn available_actions(
    State(state): State<AppState>,
    Extension(role): Extension<Role>,
    Path(lot_id): Path<String>,
) -> Result<Json<ActionsResponse>, ApiError> {
    let case = state
        .workflow
        .store()
        .find_latest(&lot_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No case for lot {}", lot_id)))?;

    Ok(Json(ActionsResponse {
        lot_id: case.lot_id.clone(),
        state: state.workflow.state_of(&case),
        actions: state.workflow.available_actions(&role, &case),
    }))
}

/// Discards every case; decision department only
pub async fn reset_cases(
    State(state): State<AppState>,
    Extension(role): Extension<Role>,
) -> Result<Json<ResetResponse>, ApiError> {
    if !matches!(role, Role::DecisionMaker(_)) {
        return Err(ApiError::Forbidden(format!("{} may not reset the case store", role)));
    }
    let removed = state.workflow.store().reset().await?;
    Ok(Json(ResetResponse { removed }))
}

fn responses(state: &AppState, cases: &[domain_cases::Case]) -> Vec<CaseResponse> {
    cases
        .iter()
        .map(|c| CaseResponse::new(c, state.workflow.state_of(c)))
        .collect()
}
