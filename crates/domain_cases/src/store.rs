//! Case Store service
//!
//! Record-level operations over an injected [`CaseStorePort`]. Every change
//! is written back with the revision it was read at, so two writers racing
//! on the same case cannot silently overwrite each other: the loser gets
//! `CaseError::StoreWriteConflict`.

use std::sync::Arc;

use core_kernel::OperationMetadata;
use tracing::{info, warn};

use crate::case::{Case, CaseUpdate, Handler};
use crate::department::{Department, DepartmentDirectory};
use crate::error::CaseError;
use crate::ports::{CaseQuery, CaseStorePort};
use crate::stats::CaseSummary;

/// Store behaviour switches
#[derive(Debug, Clone, Default)]
pub struct CaseStoreConfig {
    /// Refuse to open a second case for a lot that still has an open one
    pub reject_duplicate_open_lots: bool,
}

/// Case persistence operations used by the workflow and the API
#[derive(Clone)]
pub struct CaseStore {
    port: Arc<dyn CaseStorePort>,
    directory: DepartmentDirectory,
    config: CaseStoreConfig,
}

impl CaseStore {
    pub fn new(port: Arc<dyn CaseStorePort>, directory: DepartmentDirectory) -> Self {
        Self {
            port,
            directory,
            config: CaseStoreConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CaseStoreConfig) -> Self {
        self.config = config;
        self
    }

    pub fn directory(&self) -> &DepartmentDirectory {
        &self.directory
    }

    pub fn port(&self) -> &Arc<dyn CaseStorePort> {
        &self.port
    }

    /// Opens a new case routed to `department`
    pub async fn create(
        &self,
        lot_id: &str,
        complaint: &str,
        department: Department,
        estimated_days: u32,
    ) -> Result<Case, CaseError> {
        let lot_id = required("lot_id", lot_id)?;
        let complaint = required("complaint", complaint)?;

        if self.config.reject_duplicate_open_lots {
            if let Some(existing) = self.find_latest(lot_id).await? {
                if !existing.is_closed() {
                    return Err(CaseError::DuplicateLot(lot_id.to_string()));
                }
            }
        }

        let case = Case::open(lot_id, complaint, department, estimated_days);
        let case = self
            .port
            .insert(case, None)
            .await
            .map_err(CaseError::from_store)?;

        info!(
            case_id = %case.id,
            lot_id = %case.lot_id,
            department = %case.department,
            estimated_days = case.estimated_days,
            "Case created"
        );
        Ok(case)
    }

    /// The most recently created case for `lot_id`
    pub async fn find_latest(&self, lot_id: &str) -> Result<Option<Case>, CaseError> {
        self.port
            .find_latest_by_lot(lot_id.trim())
            .await
            .map_err(CaseError::from_store)
    }

    /// Updates the most recently created case for `lot_id`
    pub async fn update(&self, lot_id: &str, update: CaseUpdate) -> Result<Case, CaseError> {
        let case = self
            .find_latest(lot_id)
            .await?
            .ok_or_else(|| CaseError::NotFound(lot_id.to_string()))?;
        self.apply(case, update, None).await
    }

    /// Applies `update` to a case previously read from this store
    ///
    /// The write fails with `StoreWriteConflict` if the case changed since
    /// `case` was read.
    pub async fn apply(
        &self,
        mut case: Case,
        update: CaseUpdate,
        metadata: Option<OperationMetadata>,
    ) -> Result<Case, CaseError> {
        let expected_revision = case.revision;
        let history_before = case.action_history.len();
        let forced = update.force_handler.clone();

        case.apply(update, self.directory.decision_department())?;
        debug_assert!(case.action_history.len() > history_before);

        let saved = self
            .port
            .save(case, expected_revision, metadata)
            .await
            .map_err(|err| {
                if err.is_conflict() {
                    warn!(error = %err, "Concurrent case update rejected");
                }
                CaseError::from_store(err)
            })?;

        info!(
            case_id = %saved.id,
            lot_id = %saved.lot_id,
            status = %saved.status,
            handler = %saved.current_handler,
            revision = saved.revision,
            forced = forced.is_some(),
            "Case updated"
        );
        Ok(saved)
    }

    /// Open cases; `None` lists every open case regardless of handler
    pub async fn list_pending(&self, handler: Option<&Department>) -> Result<Vec<Case>, CaseError> {
        let query = CaseQuery::open_for(handler.cloned().map(Handler::Department));
        self.port.list(query).await.map_err(CaseError::from_store)
    }

    pub async fn list_closed(&self) -> Result<Vec<Case>, CaseError> {
        self.port
            .list(CaseQuery::closed())
            .await
            .map_err(CaseError::from_store)
    }

    pub async fn all(&self) -> Result<Vec<Case>, CaseError> {
        self.port
            .list(CaseQuery::default())
            .await
            .map_err(CaseError::from_store)
    }

    /// Counts for the dashboard
    pub async fn summary(&self) -> Result<CaseSummary, CaseError> {
        Ok(CaseSummary::from_cases(&self.all().await?))
    }

    /// Discards every case
    pub async fn reset(&self) -> Result<usize, CaseError> {
        let removed = self.port.clear().await.map_err(CaseError::from_store)?;
        warn!(removed, "Case store reset");
        Ok(removed)
    }
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, CaseError> {
    let value = value.trim();
    if value.is_empty() {
        Err(CaseError::validation(format!("{} is required", field)))
    } else {
        Ok(value)
    }
}
