//! Case Storage Port
//!
//! The `CaseStorePort` trait is everything the case domain needs from its
//! persistence layer. Adapters:
//!
//! - **File adapter** (`infra_store::CsvCaseStore`): the delimited-text store
//!   operators export and inspect by hand
//! - **Memory adapter** ([`memory::InMemoryCaseStore`]): tests and throwaway
//!   demo deployments
//!
//! Every adapter must preserve insertion order (lookups by lot number resolve
//! to the last inserted match) and must reject a `save` whose expected
//! revision no longer matches the stored one.

use async_trait::async_trait;

use core_kernel::{CaseId, PortError, DomainPort, OperationMetadata, HealthCheckable};

use crate::case::{Case, Handler};
use crate::department::Department;

/// Query parameters for listing cases
#[derive(Debug, Clone, Default)]
pub struct CaseQuery {
    /// Only cases owned by this handler
    pub handler: Option<Handler>,
    /// `Some(true)` for closed cases only, `Some(false)` for open cases only
    pub closed: Option<bool>,
    /// Only cases with this lot number
    pub lot_id: Option<String>,
    /// Only cases whose department of record matches
    pub department: Option<Department>,
}

impl CaseQuery {
    /// Open cases, optionally restricted to one handler
    pub fn open_for(handler: Option<Handler>) -> Self {
        Self {
            handler,
            closed: Some(false),
            ..Default::default()
        }
    }

    pub fn closed() -> Self {
        Self {
            closed: Some(true),
            ..Default::default()
        }
    }

    pub fn by_lot(lot_id: impl Into<String>) -> Self {
        Self {
            lot_id: Some(lot_id.into()),
            ..Default::default()
        }
    }

    /// Returns true if `case` satisfies every filter that is set
    pub fn matches(&self, case: &Case) -> bool {
        if let Some(ref handler) = self.handler {
            if case.current_handler != *handler {
                return false;
            }
        }
        if let Some(closed) = self.closed {
            if case.is_closed() != closed {
                return false;
            }
        }
        if let Some(ref lot_id) = self.lot_id {
            if case.lot_id != *lot_id {
                return false;
            }
        }
        if let Some(ref department) = self.department {
            if case.department != *department {
                return false;
            }
        }
        true
    }
}

/// The port trait for case persistence
#[async_trait]
pub trait CaseStorePort: DomainPort + HealthCheckable {
    /// Appends a new case and returns it as stored
    async fn insert(
        &self,
        case: Case,
        metadata: Option<OperationMetadata>,
    ) -> Result<Case, PortError>;

    /// Retrieves a case by id, or `PortError::NotFound`
    async fn get(&self, id: CaseId) -> Result<Case, PortError>;

    /// The last inserted case whose lot number equals `lot_id`
    async fn find_latest_by_lot(&self, lot_id: &str) -> Result<Option<Case>, PortError>;

    /// Replaces a stored case
    ///
    /// Fails with `PortError::Conflict` unless the stored revision equals
    /// `expected_revision`. The returned case carries the new revision.
    async fn save(
        &self,
        case: Case,
        expected_revision: u64,
        metadata: Option<OperationMetadata>,
    ) -> Result<Case, PortError>;

    /// Cases matching `query`, in insertion order
    async fn list(&self, query: CaseQuery) -> Result<Vec<Case>, PortError>;

    /// Discards every case and returns how many were removed
    async fn clear(&self) -> Result<usize, PortError>;
}

/// In-memory implementation of CaseStorePort
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;
    use chrono::Utc;
    use core_kernel::{AdapterHealth, AdapterType, HealthCheckResult};

    #[derive(Debug, Default)]
    struct MemoryState {
        cases: HashMap<CaseId, Case>,
        order: Vec<CaseId>,
    }

    /// Case store keyed by generated case id
    #[derive(Debug, Default, Clone)]
    pub struct InMemoryCaseStore {
        state: Arc<RwLock<MemoryState>>,
    }

    impl InMemoryCaseStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates with cases for testing
        pub fn with_cases(cases: Vec<Case>) -> Self {
            let mut state = MemoryState::default();
            for case in cases {
                state.order.push(case.id);
                state.cases.insert(case.id, case);
            }
            Self {
                state: Arc::new(RwLock::new(state)),
            }
        }
    }

    impl DomainPort for InMemoryCaseStore {}

    #[async_trait]
    impl HealthCheckable for InMemoryCaseStore {
        async fn health_check(&self) -> HealthCheckResult {
            let count = self.state.read().await.order.len();
            HealthCheckResult {
                adapter_id: "memory-case-store".to_string(),
                adapter_type: AdapterType::Memory,
                status: AdapterHealth::Healthy,
                latency_ms: 0,
                message: Some(format!("{} cases held in memory", count)),
                checked_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl CaseStorePort for InMemoryCaseStore {
        async fn insert(
            &self,
            case: Case,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Case, PortError> {
            let mut state = self.state.write().await;
            if state.cases.contains_key(&case.id) {
                return Err(PortError::Conflict {
                    message: format!("case {} already exists", case.id),
                });
            }
            state.order.push(case.id);
            state.cases.insert(case.id, case.clone());
            Ok(case)
        }

        async fn get(&self, id: CaseId) -> Result<Case, PortError> {
            self.state
                .read()
                .await
                .cases
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Case", id))
        }

        async fn find_latest_by_lot(&self, lot_id: &str) -> Result<Option<Case>, PortError> {
            let state = self.state.read().await;
            Ok(state
                .order
                .iter()
                .rev()
                .filter_map(|id| state.cases.get(id))
                .find(|case| case.lot_id == lot_id)
                .cloned())
        }

        async fn save(
            &self,
            mut case: Case,
            expected_revision: u64,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Case, PortError> {
            let mut state = self.state.write().await;
            let stored = state
                .cases
                .get_mut(&case.id)
                .ok_or_else(|| PortError::not_found("Case", case.id))?;

            if stored.revision != expected_revision {
                return Err(PortError::stale_revision(case.id, expected_revision, stored.revision));
            }

            case.revision = expected_revision + 1;
            *stored = case.clone();
            Ok(case)
        }

        async fn list(&self, query: CaseQuery) -> Result<Vec<Case>, PortError> {
            let state = self.state.read().await;
            Ok(state
                .order
                .iter()
                .filter_map(|id| state.cases.get(id))
                .filter(|case| query.matches(case))
                .cloned()
                .collect())
        }

        async fn clear(&self) -> Result<usize, PortError> {
            let mut state = self.state.write().await;
            let removed = state.order.len();
            state.cases.clear();
            state.order.clear();
            Ok(removed)
        }
    }
}
