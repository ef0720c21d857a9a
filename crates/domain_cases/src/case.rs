//! Case aggregate

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::CaseId;
use crate::department::Department;
use crate::error::CaseError;
use crate::history::ActionHistory;

/// Case status
///
/// Persisted and displayed as the human-readable strings operators already
/// know (`"Assigned to QC"`, `"Case Closed"`, ...). Text that matches none of
/// the known shapes is kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseStatus {
    /// Routed to a department on submission
    Assigned(Department),
    /// A department finished its investigation and forwarded the case
    InvestigationComplete,
    /// Moved by an administrative override
    Reassigned(Department),
    /// Terminal
    Closed,
    /// Unrecognised status text read from storage
    Other(String),
}

const ASSIGNED_PREFIX: &str = "Assigned to ";
const REASSIGNED_PREFIX: &str = "Re-assigned to ";
const INVESTIGATION_COMPLETE: &str = "Investigation Complete";
const CASE_CLOSED: &str = "Case Closed";

impl CaseStatus {
    pub fn is_closed(&self) -> bool {
        matches!(self, CaseStatus::Closed)
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseStatus::Assigned(d) => write!(f, "{}{}", ASSIGNED_PREFIX, d),
            CaseStatus::InvestigationComplete => f.write_str(INVESTIGATION_COMPLETE),
            CaseStatus::Reassigned(d) => write!(f, "{}{}", REASSIGNED_PREFIX, d),
            CaseStatus::Closed => f.write_str(CASE_CLOSED),
            CaseStatus::Other(text) => f.write_str(text),
        }
    }
}

impl FromStr for CaseStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let status = if s == CASE_CLOSED {
            CaseStatus::Closed
        } else if s == INVESTIGATION_COMPLETE {
            CaseStatus::InvestigationComplete
        } else if let Some(d) = s.strip_prefix(REASSIGNED_PREFIX).and_then(|d| Department::new(d).ok()) {
            CaseStatus::Reassigned(d)
        } else if let Some(d) = s.strip_prefix(ASSIGNED_PREFIX).and_then(|d| Department::new(d).ok()) {
            CaseStatus::Assigned(d)
        } else {
            CaseStatus::Other(s.to_string())
        };
        Ok(status)
    }
}

/// Who currently owns a case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Handler {
    Department(Department),
    /// Written when a case is closed; nobody owns it any more
    Completed,
}

const COMPLETED: &str = "Completed";

impl Handler {
    pub fn department(&self) -> Option<&Department> {
        match self {
            Handler::Department(d) => Some(d),
            Handler::Completed => None,
        }
    }

    pub fn is(&self, department: &Department) -> bool {
        self.department() == Some(department)
    }

    /// Parses a stored handler value; placeholders yield `None`
    ///
    /// Older stores used `System` (or left the cell empty) while a case was
    /// still being routed. Those rows need their handler backfilled from the
    /// department.
    pub fn parse_stored(raw: &str) -> Option<Handler> {
        match raw.trim() {
            "" | "System" | "nan" => None,
            COMPLETED => Some(Handler::Completed),
            label => Department::new(label).ok().map(Handler::Department),
        }
    }
}

impl From<Department> for Handler {
    fn from(department: Department) -> Self {
        Handler::Department(department)
    }
}

impl fmt::Display for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Department(d) => write!(f, "{}", d),
            Handler::Completed => f.write_str(COMPLETED),
        }
    }
}

/// Outcome recorded when a case is closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FinalDecision {
    Approve,
    Compromise,
    Reject,
}

impl FinalDecision {
    pub const ALL: [FinalDecision; 3] = [
        FinalDecision::Approve,
        FinalDecision::Compromise,
        FinalDecision::Reject,
    ];
}

impl fmt::Display for FinalDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FinalDecision::Approve => "Approve",
            FinalDecision::Compromise => "Compromise",
            FinalDecision::Reject => "Reject",
        };
        f.write_str(label)
    }
}

impl FromStr for FinalDecision {
    type Err = CaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "approve" => Ok(FinalDecision::Approve),
            "compromise" => Ok(FinalDecision::Compromise),
            "reject" => Ok(FinalDecision::Reject),
            other => Err(CaseError::validation(format!("unknown final decision: {}", other))),
        }
    }
}

/// A tracked customer complaint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    /// Store key
    pub id: CaseId,
    /// Lot number supplied by the customer; not unique
    pub lot_id: String,
    pub created_at: DateTime<Utc>,
    pub complaint: String,
    /// Department of record; only an override changes it
    pub department: Department,
    pub status: CaseStatus,
    pub estimated_days: u32,
    pub current_handler: Handler,
    pub action_history: ActionHistory,
    pub final_decision: Option<FinalDecision>,
    pub resolution_note: Option<String>,
    /// Bumped by the store on every saved change
    pub revision: u64,
}

impl Case {
    /// Opens a case routed to `department`
    pub fn open(
        lot_id: impl Into<String>,
        complaint: impl Into<String>,
        department: Department,
        estimated_days: u32,
    ) -> Self {
        let now = Utc::now();
        let mut action_history = ActionHistory::new();
        action_history.record(now, format!("Case Created -> AI Assigned to {}", department));

        Self {
            id: CaseId::new_v7(),
            lot_id: lot_id.into(),
            created_at: now,
            complaint: complaint.into(),
            status: CaseStatus::Assigned(department.clone()),
            current_handler: Handler::Department(department.clone()),
            department,
            estimated_days,
            action_history,
            final_decision: None,
            resolution_note: None,
            revision: 0,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.status.is_closed()
    }

    /// Applies an update in place
    ///
    /// `override_actor` names the department performing a forced reassignment
    /// and is only used to annotate the history note. An update that closes
    /// the case must carry its final decision; one stored earlier does not count.
    pub fn apply(&mut self, update: CaseUpdate, override_actor: &Department) -> Result<(), CaseError> {
        let closing = update.status.is_closed();
        if closing && update.final_decision.is_none() {
            return Err(CaseError::validation(format!(
                "closing case {} requires a final decision in the same update",
                self.lot_id
            )));
        }

        let CaseUpdate {
            mut status,
            mut note,
            next_handler,
            final_decision,
            resolution_note,
            force_handler,
        } = update;

        if let Some(forced) = force_handler {
            self.current_handler = Handler::Department(forced.clone());
            if !closing {
                self.department = forced.clone();
                status = CaseStatus::Reassigned(forced);
            }
            note.push_str(&format!(
                " ({} Manual Override: Correcting Department)",
                override_actor
            ));
        }

        self.status = status;
        self.action_history.record(Utc::now(), note);

        if let Some(handler) = next_handler {
            self.current_handler = handler;
        }
        if let Some(decision) = final_decision {
            self.final_decision = Some(decision);
        }
        if let Some(resolution) = resolution_note.filter(|r| !r.trim().is_empty()) {
            self.resolution_note = Some(resolution);
        }

        Ok(())
    }
}

/// A change to an existing case
#[derive(Debug, Clone)]
pub struct CaseUpdate {
    pub status: CaseStatus,
    pub note: String,
    pub next_handler: Option<Handler>,
    pub final_decision: Option<FinalDecision>,
    pub resolution_note: Option<String>,
    /// Administrative reassignment; also moves the department unless closing
    pub force_handler: Option<Department>,
}

impl CaseUpdate {
    pub fn new(status: CaseStatus, note: impl Into<String>) -> Self {
        Self {
            status,
            note: note.into(),
            next_handler: None,
            final_decision: None,
            resolution_note: None,
            force_handler: None,
        }
    }

    pub fn with_next_handler(mut self, handler: impl Into<Handler>) -> Self {
        self.next_handler = Some(handler.into());
        self
    }

    pub fn with_final_decision(mut self, decision: FinalDecision) -> Self {
        self.final_decision = Some(decision);
        self
    }

    pub fn with_resolution_note(mut self, note: impl Into<String>) -> Self {
        self.resolution_note = Some(note.into());
        self
    }

    pub fn forcing(mut self, department: Department) -> Self {
        self.force_handler = Some(department);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dept(label: &str) -> Department {
        Department::new(label).unwrap()
    }

    #[test]
    fn test_status_text_round_trip() {
        for status in [
            CaseStatus::Assigned(dept("QC")),
            CaseStatus::InvestigationComplete,
            CaseStatus::Reassigned(dept("QA")),
            CaseStatus::Closed,
            CaseStatus::Other("Waiting on customer".to_string()),
        ] {
            let parsed: CaseStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_handler_placeholders() {
        assert_eq!(Handler::parse_stored("System"), None);
        assert_eq!(Handler::parse_stored(""), None);
        assert_eq!(Handler::parse_stored("Completed"), Some(Handler::Completed));
        assert_eq!(Handler::parse_stored("QA"), Some(Handler::Department(dept("QA"))));
    }

    #[test]
    fn test_final_decision_parse_is_case_insensitive() {
        assert_eq!("compromise".parse::<FinalDecision>().unwrap(), FinalDecision::Compromise);
        assert!("maybe".parse::<FinalDecision>().is_err());
    }

    #[test]
    fn test_force_while_closing_keeps_department() {
        let mut case = Case::open("LOT-1", "scratch", dept("QC"), 5);
        let update = CaseUpdate::new(CaseStatus::Closed, "MCS: Reject")
            .with_final_decision(FinalDecision::Reject)
            .forcing(dept("QA"));

        case.apply(update, &dept("MCS")).unwrap();

        assert_eq!(case.department, dept("QC"));
        assert_eq!(case.current_handler, Handler::Department(dept("QA")));
        assert_eq!(case.status, CaseStatus::Closed);
    }

    #[test]
    fn test_empty_resolution_does_not_clear() {
        let mut case = Case::open("LOT-1", "scratch", dept("MCS"), 2);
        case.apply(
            CaseUpdate::new(CaseStatus::Closed, "MCS: Approve")
                .with_final_decision(FinalDecision::Approve)
                .with_resolution_note("replacement shipped"),
            &dept("MCS"),
        )
        .unwrap();
        case.apply(
            CaseUpdate::new(CaseStatus::Closed, "MCS: note")
                .with_final_decision(FinalDecision::Approve)
                .with_resolution_note("  "),
            &dept("MCS"),
        )
        .unwrap();

        assert_eq!(case.resolution_note.as_deref(), Some("replacement shipped"));
        assert_eq!(case.final_decision, Some(FinalDecision::Approve));
    }

    #[test]
    fn test_stored_decision_does_not_satisfy_close() {
        let mut case = Case::open("LOT-1", "scratch", dept("MCS"), 2);
        case.apply(
            CaseUpdate::new(CaseStatus::InvestigationComplete, "MCS: checked")
                .with_final_decision(FinalDecision::Approve),
            &dept("MCS"),
        )
        .unwrap();
        let before = case.clone();

        let result = case.apply(CaseUpdate::new(CaseStatus::Closed, "MCS: close"), &dept("MCS"));

        assert!(matches!(result, Err(CaseError::Validation(_))));
        assert_eq!(case, before);
    }
}
