//! Test Data Builders
//!
//! Builders for cases and fully wired workflows. Tests set only the fields
//! they care about and take defaults for everything else.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use domain_cases::{
    Case, CaseStatus, CaseStore, CaseStoreConfig, Department, DepartmentDirectory, FinalDecision,
    FixedRouter, Handler, InMemoryCaseStore, Role, WorkflowController,
};

use crate::fixtures::{ComplaintFixtures, DepartmentFixtures, LotFixtures};

/// Builder for constructing cases without going through a store
pub struct TestCaseBuilder {
    lot_id: String,
    complaint: String,
    department: Department,
    estimated_days: u32,
    created_at: Option<DateTime<Utc>>,
    handler: Option<Handler>,
    status: Option<CaseStatus>,
    final_decision: Option<FinalDecision>,
    resolution_note: Option<String>,
    notes: Vec<String>,
}

impl Default for TestCaseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestCaseBuilder {
    /// Creates a new builder for an open QC case
    pub fn new() -> Self {
        Self {
            lot_id: LotFixtures::lot(1),
            complaint: ComplaintFixtures::surface_scratch().to_string(),
            department: DepartmentFixtures::qc(),
            estimated_days: 5,
            created_at: None,
            handler: None,
            status: None,
            final_decision: None,
            resolution_note: None,
            notes: Vec::new(),
        }
    }

    pub fn with_lot_id(mut self, lot_id: impl Into<String>) -> Self {
        self.lot_id = lot_id.into();
        self
    }

    pub fn with_complaint(mut self, complaint: impl Into<String>) -> Self {
        self.complaint = complaint.into();
        self
    }

    /// Routes the case to `department` and makes it the handler
    pub fn assigned_to(mut self, department: Department) -> Self {
        self.department = department;
        self
    }

    pub fn with_estimated_days(mut self, days: u32) -> Self {
        self.estimated_days = days;
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    /// Overrides the current handler without touching the status
    pub fn handled_by(mut self, handler: impl Into<Handler>) -> Self {
        self.handler = Some(handler.into());
        self
    }

    /// Appends an extra history note
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Marks the case forwarded to MCS
    pub fn forwarded(mut self) -> Self {
        self.status = Some(CaseStatus::InvestigationComplete);
        self.handler = Some(Handler::Department(DepartmentFixtures::mcs()));
        self
    }

    /// Marks the case closed with `decision`
    pub fn closed(mut self, decision: FinalDecision, note: impl Into<String>) -> Self {
        self.status = Some(CaseStatus::Closed);
        self.handler = Some(Handler::Completed);
        self.final_decision = Some(decision);
        self.resolution_note = Some(note.into());
        self
    }

    pub fn build(self) -> Case {
        let mut case = Case::open(self.lot_id, self.complaint, self.department, self.estimated_days);
        if let Some(at) = self.created_at {
            case.created_at = at;
        }
        for note in &self.notes {
            case.action_history.record(case.created_at, note);
        }
        if let Some(status) = self.status {
            case.status = status;
        }
        if let Some(handler) = self.handler {
            case.current_handler = handler;
        }
        case.final_decision = self.final_decision;
        case.resolution_note = self.resolution_note;
        case
    }
}

/// A workflow over an in-memory store and a fixed router
pub struct TestWorkflow {
    pub controller: WorkflowController,
    pub store: Arc<InMemoryCaseStore>,
    pub router: Arc<FixedRouter>,
}

impl TestWorkflow {
    /// The role `label` acts in
    ///
    /// # Panics
    ///
    /// Panics if `label` is not in the workflow's directory
    pub fn role(&self, label: &str) -> Role {
        self.controller
            .role_of(&DepartmentFixtures::named(label))
            .unwrap_or_else(|e| panic!("no role for {}: {}", label, e))
    }
}

/// Builder for [`TestWorkflow`]
pub struct TestWorkflowBuilder {
    directory: DepartmentDirectory,
    route_to: Department,
    router_failures: u32,
    config: CaseStoreConfig,
    seed: Vec<Case>,
}

impl Default for TestWorkflowBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorkflowBuilder {
    /// QC, QA and MCS; every complaint routes to QC
    pub fn new() -> Self {
        Self {
            directory: DepartmentFixtures::default_directory(),
            route_to: DepartmentFixtures::qc(),
            router_failures: 0,
            config: CaseStoreConfig::default(),
            seed: Vec::new(),
        }
    }

    /// Replaces the directory; MCS stays the decision department
    pub fn with_departments(mut self, labels: &[&str]) -> Self {
        self.directory = DepartmentFixtures::directory(labels);
        self
    }

    pub fn with_directory(mut self, directory: DepartmentDirectory) -> Self {
        self.directory = directory;
        self
    }

    /// Label the router returns for every complaint
    pub fn routing_to(mut self, label: &str) -> Self {
        self.route_to = DepartmentFixtures::named(label);
        self
    }

    /// Makes the first `n` router calls fail
    pub fn router_failing(mut self, n: u32) -> Self {
        self.router_failures = n;
        self
    }

    pub fn with_store_config(mut self, config: CaseStoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Cases present in the store before the test starts
    pub fn with_cases(mut self, cases: Vec<Case>) -> Self {
        self.seed = cases;
        self
    }

    pub fn build(self) -> TestWorkflow {
        let store = Arc::new(InMemoryCaseStore::with_cases(self.seed));
        let router = Arc::new(FixedRouter::new(self.route_to).failing_first(self.router_failures));
        let cases = CaseStore::new(store.clone(), self.directory).with_config(self.config);
        let controller = WorkflowController::new(cases, router.clone());

        TestWorkflow {
            controller,
            store,
            router,
        }
    }
}
