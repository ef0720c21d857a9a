//! Case domain errors

use core_kernel::PortError;
use thiserror::Error;

/// Errors that can occur in the case domain
#[derive(Debug, Error)]
pub enum CaseError {
    #[error("Case not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Write conflict: {0}")]
    StoreWriteConflict(String),

    #[error("External service unavailable: {0}")]
    ExternalServiceUnavailable(String),

    #[error("Cannot {action} case {lot_id} while it is {state}")]
    InvalidTransition {
        lot_id: String,
        state: String,
        action: String,
    },

    #[error("{role} may not {action} case {lot_id}")]
    Forbidden {
        role: String,
        action: String,
        lot_id: String,
    },

    #[error("Lot {0} already has an open case")]
    DuplicateLot(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl CaseError {
    pub fn validation(message: impl Into<String>) -> Self {
        CaseError::Validation(message.into())
    }

    /// Maps an error raised by a storage adapter
    pub fn from_store(err: PortError) -> Self {
        match err {
            PortError::NotFound { id, .. } => CaseError::NotFound(id),
            PortError::Validation { message, .. } => CaseError::Validation(message),
            PortError::Conflict { message } => CaseError::StoreWriteConflict(message),
            other => CaseError::Storage(other.to_string()),
        }
    }

    /// Maps an error raised by the complaint router
    ///
    /// Anything the router could not answer is reported as an outage so the
    /// caller can retry the submission later; only bad input stays a
    /// validation error.
    pub fn from_router(err: PortError) -> Self {
        match err {
            PortError::Validation { message, .. } => CaseError::Validation(message),
            other => CaseError::ExternalServiceUnavailable(other.to_string()),
        }
    }

    /// Returns true if repeating the same request later may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CaseError::ExternalServiceUnavailable(_) | CaseError::StoreWriteConflict(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CaseError::NotFound(_))
    }
}
