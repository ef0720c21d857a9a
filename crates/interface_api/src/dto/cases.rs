//! Case DTOs

use chrono::{DateTime, Utc};
use domain_cases::{Action, Case, HistoryEntry, WorkflowState};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitCaseRequest {
    #[validate(length(min = 1, max = 64, message = "lot_id must be 1-64 characters"))]
    pub lot_id: String,
    #[validate(length(min = 1, max = 4000, message = "complaint must be 1-4000 characters"))]
    pub complaint: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ForwardRequest {
    /// Investigation findings; may be empty
    #[serde(default)]
    #[validate(length(max = 4000))]
    pub note: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CloseRequest {
    /// `Approve`, `Compromise` or `Reject`, any case
    #[validate(length(min = 1))]
    pub decision: String,
    /// Message returned to the customer
    #[validate(length(min = 1, max = 4000, message = "a note to the customer is required"))]
    pub customer_note: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReassignRequest {
    #[validate(length(min = 1, max = 64))]
    pub department: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryEntryResponse {
    pub at: DateTime<Utc>,
    pub note: String,
}

impl From<&HistoryEntry> for HistoryEntryResponse {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            at: entry.at,
            note: entry.note.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CaseResponse {
    pub id: String,
    pub lot_id: String,
    pub created_at: DateTime<Utc>,
    pub complaint: String,
    pub department: String,
    pub status: String,
    pub state: WorkflowState,
    pub estimated_days: u32,
    pub current_handler: String,
    pub action_history: Vec<HistoryEntryResponse>,
    pub final_decision: Option<String>,
    pub resolution_note: Option<String>,
    pub revision: u64,
}

impl CaseResponse {
    pub fn new(case: &Case, state: WorkflowState) -> Self {
        Self {
            id: case.id.to_string(),
            lot_id: case.lot_id.clone(),
            created_at: case.created_at,
            complaint: case.complaint.clone(),
            department: case.department.to_string(),
            status: case.status.to_string(),
            state,
            estimated_days: case.estimated_days,
            current_handler: case.current_handler.to_string(),
            action_history: case.action_history.entries().iter().map(Into::into).collect(),
            final_decision: case.final_decision.map(|d| d.to_string()),
            resolution_note: case.resolution_note.clone(),
            revision: case.revision,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActionsResponse {
    pub lot_id: String,
    pub state: WorkflowState,
    pub actions: Vec<Action>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResetResponse {
    pub removed: usize,
}
