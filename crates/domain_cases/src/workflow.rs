//! Case workflow
//!
//! Decides which department may do what to a case, given who holds it.
//!
//! ```text
//! Assigned ──forward──▶ PendingFinalDecision ──close──▶ Closed
//!     │                        ▲
//!     └────── override ────────┘   (override: any open state, decision role only)
//! ```
//!
//! Closed is terminal. Nothing reopens a case.

use std::fmt;
use std::sync::Arc;

use core_kernel::OperationMetadata;
use serde::{Deserialize, Serialize};

use crate::case::{Case, CaseStatus, CaseUpdate, FinalDecision, Handler};
use crate::department::{Department, Role};
use crate::error::CaseError;
use crate::router::ComplaintRouter;
use crate::store::CaseStore;

/// Where a case stands, derived from its status and handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowState {
    Assigned,
    Investigating,
    PendingFinalDecision,
    Closed,
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WorkflowState::Assigned => "assigned",
            WorkflowState::Investigating => "investigating",
            WorkflowState::PendingFinalDecision => "pending final decision",
            WorkflowState::Closed => "closed",
        };
        f.write_str(label)
    }
}

/// Something a role can do to a case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    InvestigateAndForward,
    Close,
    Override,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Action::InvestigateAndForward => "forward",
            Action::Close => "close",
            Action::Override => "override",
        };
        f.write_str(label)
    }
}

/// Role-gated case operations
#[derive(Clone)]
pub struct WorkflowController {
    store: CaseStore,
    router: Arc<dyn ComplaintRouter>,
}

impl WorkflowController {
    pub fn new(store: CaseStore, router: Arc<dyn ComplaintRouter>) -> Self {
        Self { store, router }
    }

    pub fn store(&self) -> &CaseStore {
        &self.store
    }

    /// Resolves the role a department acts in
    pub fn role_of(&self, department: &Department) -> Result<Role, CaseError> {
        self.store.directory().role_of(department)
    }

    pub fn state_of(&self, case: &Case) -> WorkflowState {
        if case.is_closed() {
            return WorkflowState::Closed;
        }
        if case.current_handler.is(self.store.directory().decision_department()) {
            return WorkflowState::PendingFinalDecision;
        }
        match case.status {
            CaseStatus::Assigned(_) => WorkflowState::Assigned,
            _ => WorkflowState::Investigating,
        }
    }

    /// Actions `role` may take on `case` right now
    pub fn available_actions(&self, role: &Role, case: &Case) -> Vec<Action> {
        if case.is_closed() {
            return Vec::new();
        }
        match role {
            Role::DecisionMaker(d) => {
                let mut actions = Vec::new();
                if case.current_handler.is(d) {
                    actions.push(Action::Close);
                }
                actions.push(Action::Override);
                actions
            }
            Role::Investigator(d) if case.current_handler.is(d) => {
                vec![Action::InvestigateAndForward]
            }
            Role::Investigator(_) => Vec::new(),
        }
    }

    /// Routes a new complaint and opens a case for it
    pub async fn submit(&self, lot_id: &str, complaint: &str) -> Result<Case, CaseError> {
        if lot_id.trim().is_empty() || complaint.trim().is_empty() {
            return Err(CaseError::validation("lot_id and complaint are required"));
        }

        let routed = self
            .router
            .classify(complaint)
            .await
            .map_err(CaseError::from_router)?;
        let directory = self.store.directory();
        let department = directory.resolve(routed.as_str())?;
        let days = directory.estimated_days(&department);

        self.store.create(lot_id, complaint, department, days).await
    }

    /// Cases waiting on `role`
    ///
    /// The decision department oversees every open case; other departments
    /// only see their own queue.
    pub async fn pending_for(&self, role: &Role) -> Result<Vec<Case>, CaseError> {
        match role {
            Role::DecisionMaker(_) => self.store.list_pending(None).await,
            Role::Investigator(d) => self.store.list_pending(Some(d)).await,
        }
    }

    /// Records an investigation note and hands the case to the decision department
    pub async fn investigate_and_forward(
        &self,
        role: &Role,
        lot_id: &str,
        note: &str,
    ) -> Result<Case, CaseError> {
        let case = self.authorize(role, lot_id, Action::InvestigateAndForward).await?;
        let decision = self.store.directory().decision_department().clone();

        let update = CaseUpdate::new(
            CaseStatus::InvestigationComplete,
            format!("{}: {}", role, note.trim()),
        )
        .with_next_handler(decision);

        self.store.apply(case, update, Some(metadata(role, lot_id))).await
    }

    /// Closes a case with a final decision and a customer-facing note
    pub async fn close(
        &self,
        role: &Role,
        lot_id: &str,
        decision: FinalDecision,
        customer_note: &str,
    ) -> Result<Case, CaseError> {
        let customer_note = customer_note.trim();
        if customer_note.is_empty() {
            return Err(CaseError::validation("a note to the customer is required to close a case"));
        }
        let case = self.authorize(role, lot_id, Action::Close).await?;

        let update = CaseUpdate::new(CaseStatus::Closed, format!("{}: {}", role, decision))
            .with_next_handler(Handler::Completed)
            .with_final_decision(decision)
            .with_resolution_note(customer_note);

        self.store.apply(case, update, Some(metadata(role, lot_id))).await
    }

    /// Moves an open case to another department, correcting its department of record
    pub async fn override_reassign(
        &self,
        role: &Role,
        lot_id: &str,
        new_handler: &Department,
    ) -> Result<Case, CaseError> {
        let new_handler = self.store.directory().resolve(new_handler.as_str())?;
        let case = self.authorize(role, lot_id, Action::Override).await?;

        let update = CaseUpdate::new(
            CaseStatus::Reassigned(new_handler.clone()),
            format!("{} Master Override", role),
        )
        .forcing(new_handler);

        self.store.apply(case, update, Some(metadata(role, lot_id))).await
    }

    async fn authorize(&self, role: &Role, lot_id: &str, action: Action) -> Result<Case, CaseError> {
        let case = self
            .store
            .find_latest(lot_id)
            .await?
            .ok_or_else(|| CaseError::NotFound(lot_id.to_string()))?;

        if case.is_closed() {
            return Err(CaseError::InvalidTransition {
                lot_id: case.lot_id.clone(),
                state: self.state_of(&case).to_string(),
                action: action.to_string(),
            });
        }

        if !self.available_actions(role, &case).contains(&action) {
            return Err(CaseError::Forbidden {
                role: role.to_string(),
                action: action.to_string(),
                lot_id: case.lot_id.clone(),
            });
        }

        Ok(case)
    }
}

fn metadata(role: &Role, lot_id: &str) -> OperationMetadata {
    OperationMetadata::default()
        .initiated_by(role.to_string())
        .with_context("lot_id", lot_id)
}
