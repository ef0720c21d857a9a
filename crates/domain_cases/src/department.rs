//! Departments, roles, and the department directory
//!
//! A department is both a routing target and a role that can act on cases.
//! One department is configured as the decision department: it closes cases
//! and may override any assignment. Every other department investigates.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CaseError;

/// A handling department label such as `QC`, `QA` or `MCS`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Department(String);

impl Department {
    /// Creates a department from a label, trimming surrounding whitespace
    pub fn new(label: impl AsRef<str>) -> Result<Self, CaseError> {
        let label = label.as_ref().trim();
        if label.is_empty() {
            return Err(CaseError::validation("department label is empty"));
        }
        Ok(Self(label.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a department is allowed to do in the workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    /// Investigates cases in its own queue and forwards them for decision
    Investigator(Department),
    /// Makes final decisions and may override any open case
    DecisionMaker(Department),
}

impl Role {
    pub fn department(&self) -> &Department {
        match self {
            Role::Investigator(d) | Role::DecisionMaker(d) => d,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.department())
    }
}

/// The set of departments a deployment knows about
#[derive(Debug, Clone)]
pub struct DepartmentDirectory {
    departments: Vec<Department>,
    decision: Department,
    sla_days: HashMap<Department, u32>,
    default_sla_days: u32,
}

impl Default for DepartmentDirectory {
    fn default() -> Self {
        let qc = Department("QC".to_string());
        let qa = Department("QA".to_string());
        let mcs = Department("MCS".to_string());

        let sla_days = HashMap::from([(qc.clone(), 5), (qa.clone(), 1), (mcs.clone(), 2)]);

        Self {
            departments: vec![qc, qa, mcs.clone()],
            decision: mcs,
            sla_days,
            default_sla_days: 3,
        }
    }
}

impl DepartmentDirectory {
    /// Builds a directory; the decision department must be one of `departments`
    pub fn new(
        departments: Vec<Department>,
        decision: Department,
        default_sla_days: u32,
    ) -> Result<Self, CaseError> {
        if !departments.contains(&decision) {
            return Err(CaseError::validation(format!(
                "decision department {} is not in the department list",
                decision
            )));
        }
        Ok(Self {
            departments,
            decision,
            sla_days: HashMap::new(),
            default_sla_days,
        })
    }

    /// Sets the estimated resolution time for a department
    pub fn with_sla_days(mut self, department: Department, days: u32) -> Self {
        self.sla_days.insert(department, days);
        self
    }

    pub fn departments(&self) -> &[Department] {
        &self.departments
    }

    pub fn decision_department(&self) -> &Department {
        &self.decision
    }

    pub fn is_known(&self, department: &Department) -> bool {
        self.departments.contains(department)
    }

    /// Resolves a free-form label to a known department
    pub fn resolve(&self, label: &str) -> Result<Department, CaseError> {
        let department = Department::new(label)?;
        if self.is_known(&department) {
            Ok(department)
        } else {
            Err(CaseError::validation(format!("unknown department: {}", department)))
        }
    }

    /// Returns the role a known department plays
    pub fn role_of(&self, department: &Department) -> Result<Role, CaseError> {
        if !self.is_known(department) {
            return Err(CaseError::validation(format!("unknown department: {}", department)));
        }
        if *department == self.decision {
            Ok(Role::DecisionMaker(department.clone()))
        } else {
            Ok(Role::Investigator(department.clone()))
        }
    }

    /// Estimated working days to resolve a case routed to `department`
    pub fn estimated_days(&self, department: &Department) -> u32 {
        self.sla_days
            .get(department)
            .copied()
            .unwrap_or(self.default_sla_days)
    }
}
