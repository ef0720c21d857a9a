//! Claim Case Tracking Domain
//!
//! This crate tracks customer complaints against steel lots from submission
//! to final decision.
//!
//! # Case Lifecycle
//!
//! ```text
//! submit -> Assigned to {dept} -> Investigation Complete -> Case Closed
//!                  \__________ Re-assigned to {dept} (override) __/
//! ```
//!
//! A router picks the department on submission. Investigating departments
//! forward cases to the decision department, which closes them with
//! Approve, Compromise or Reject. The decision department may also
//! reassign any open case.

pub mod case;
pub mod department;
pub mod error;
pub mod history;
pub mod ports;
pub mod router;
pub mod stats;
pub mod store;
pub mod workflow;

pub use case::{Case, CaseStatus, CaseUpdate, FinalDecision, Handler};
pub use department::{Department, DepartmentDirectory, Role};
pub use error::CaseError;
pub use history::{ActionHistory, HistoryEntry};
pub use ports::{CaseQuery, CaseStorePort};
pub use ports::memory::InMemoryCaseStore;
pub use router::{ComplaintRouter, KeywordRouter, KeywordRule, ResilientRouter};
#[cfg(any(test, feature = "mock"))]
pub use router::mock::FixedRouter;
pub use stats::CaseSummary;
pub use store::{CaseStore, CaseStoreConfig};
pub use workflow::{Action, WorkflowController, WorkflowState};
