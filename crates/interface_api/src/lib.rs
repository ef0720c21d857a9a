//! HTTP API Layer
//!
//! This crate provides the REST API for claim case tracking using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Request handlers for cases, dashboard and health
//! - **Middleware**: Authentication, department resolution, audit logging
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Consistent error responses
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::from_config(config).await?;
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    middleware as axum_middleware,
};
use core_kernel::{CircuitBreakerConfig, CoreError};
use domain_cases::{
    CaseStore, CaseStorePort, ComplaintRouter, InMemoryCaseStore, KeywordRouter, ResilientRouter,
    WorkflowController,
};
use infra_store::CsvCaseStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::{ApiConfig, StorageBackend};
use crate::handlers::{cases, dashboard, health};
use crate::middleware::{audit_middleware, auth_middleware, MakeRequestIdV7};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub workflow: WorkflowController,
    pub config: ApiConfig,
}

impl AppState {
    /// Wires the store, router and workflow described by `config`
    pub async fn from_config(config: ApiConfig) -> Result<Self, CoreError> {
        config.validate()?;
        let directory = config.directory()?;

        let port: Arc<dyn CaseStorePort> = match config.storage_backend {
            StorageBackend::Csv => {
                let store = CsvCaseStore::open(&config.store_path).await.map_err(|e| {
                    CoreError::configuration(format!("cannot open {}: {}", config.store_path, e))
                })?;
                Arc::new(store)
            }
            StorageBackend::Memory => Arc::new(InMemoryCaseStore::new()),
        };

        let classifier = KeywordRouter::steel_mill_defaults()?;
        let router: Arc<dyn ComplaintRouter> = Arc::new(ResilientRouter::new(
            classifier,
            config.router_retry(),
            Some(CircuitBreakerConfig::default()),
        ));

        info!(
            backend = ?config.storage_backend,
            departments = ?config.departments,
            decision = %config.decision_department,
            "Case workflow configured"
        );

        let store = CaseStore::new(port, directory).with_config(config.store_config());
        Ok(Self {
            workflow: WorkflowController::new(store, router),
            config,
        })
    }
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let case_routes = Router::new()
        .route("/", post(cases::submit_case).delete(cases::reset_cases))
        .route("/pending", get(cases::list_pending))
        .route("/closed", get(cases::list_closed))
        .route("/track/:lot_id", get(cases::track_case))
        .route("/:lot_id/actions", get(cases::available_actions))
        .route("/:lot_id/forward", post(cases::forward_case))
        .route("/:lot_id/close", post(cases::close_case))
        .route("/:lot_id/reassign", post(cases::reassign_case));

    // Protected API routes
    let api_routes = Router::new()
        .nest("/cases", case_routes)
        .route("/dashboard", get(dashboard::dashboard))
        .route("/export", get(dashboard::export_report))
        .layer(axum_middleware::from_fn_with_state(state.clone(), audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestIdV7))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
