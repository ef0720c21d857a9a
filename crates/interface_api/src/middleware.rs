//! API middleware

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use core_kernel::RequestId;
use domain_cases::Role;
use tower_http::request_id::MakeRequestId;
use tracing::{info, warn};

use crate::AppState;
use crate::auth::{AuthError, Claims};

/// Header carrying the per-request correlation id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Issues time-ordered `REQ-...` ids for requests that arrive without one
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestIdV7;

impl MakeRequestId for MakeRequestIdV7 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<tower_http::request_id::RequestId> {
        HeaderValue::from_str(&RequestId::new_v7().to_string())
            .ok()
            .map(tower_http::request_id::RequestId::new)
    }
}

/// Authentication middleware
///
/// Validates JWT tokens and resolves the department the caller acts for.
/// Both the claims and the resolved [`Role`] are added to the request
/// extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    let token = match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) => token,
        None => {
            warn!("Missing or invalid Authorization header");
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    let claims = match crate::auth::validate_token(token, &state.config.jwt_secret) {
        Ok(claims) => claims,
        Err(e) => {
            warn!(error = %e, "Token validation failed");
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    let Some(role) = claims.acting_role(state.workflow.store().directory()) else {
        warn!(user = %claims.sub, roles = ?claims.roles, error = %AuthError::NoDepartmentRole, "Rejected caller");
        return Err(StatusCode::FORBIDDEN);
    };

    request.extensions_mut().insert(claims);
    request.extensions_mut().insert(role);
    Ok(next.run(request).await)
}

/// Audit logging middleware
///
/// Logs every API request with the caller, the department it acted for and
/// the request id.
pub async fn audit_middleware(
    State(_state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let user_id = request
        .extensions()
        .get::<Claims>()
        .map(|c| c.sub.clone())
        .unwrap_or_else(|| "anonymous".to_string());
    let department = request
        .extensions()
        .get::<Role>()
        .map(|r| r.to_string())
        .unwrap_or_else(|| "-".to_string());

    let start = Utc::now();

    let response = next.run(request).await;

    let duration = Utc::now() - start;
    let status = response.status();

    info!(
        method = %method,
        uri = %uri,
        request_id = %request_id,
        user = %user_id,
        department = %department,
        status = %status.as_u16(),
        duration_ms = duration.num_milliseconds(),
        "API request"
    );

    response
}
