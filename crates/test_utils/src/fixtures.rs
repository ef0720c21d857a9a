//! Pre-built Test Fixtures
//!
//! Ready-to-use departments, lots and complaints. The values match the
//! default steel-mill directory so tests read like real submissions.

use chrono::{DateTime, TimeZone, Utc};
use domain_cases::{Department, DepartmentDirectory};

/// Fixture for departments
pub struct DepartmentFixtures;

impl DepartmentFixtures {
    /// Quality Control, the default investigator for surface defects
    pub fn qc() -> Department {
        Self::named("QC")
    }

    /// Quality Assurance, handles certificates and paperwork
    pub fn qa() -> Department {
        Self::named("QA")
    }

    /// Marketing & Customer Service, the decision department
    pub fn mcs() -> Department {
        Self::named("MCS")
    }

    /// A department outside the default directory
    pub fn logistics() -> Department {
        Self::named("Logistics")
    }

    pub fn named(label: &str) -> Department {
        Department::new(label).expect("fixture department labels are non-empty")
    }

    /// QC, QA and MCS with MCS deciding
    pub fn default_directory() -> DepartmentDirectory {
        DepartmentDirectory::default()
    }

    /// Directory over `labels`; MCS decides and is added if missing
    pub fn directory(labels: &[&str]) -> DepartmentDirectory {
        let mut departments: Vec<Department> = labels.iter().map(|l| Self::named(l)).collect();
        if !departments.contains(&Self::mcs()) {
            departments.push(Self::mcs());
        }
        let defaults = DepartmentDirectory::default();
        let mut directory = DepartmentDirectory::new(departments.clone(), Self::mcs(), 3)
            .expect("MCS is always listed");
        for department in &departments {
            if defaults.is_known(department) {
                directory = directory.with_sla_days(department.clone(), defaults.estimated_days(department));
            }
        }
        directory
    }
}

/// Fixture for complaint texts
pub struct ComplaintFixtures;

impl ComplaintFixtures {
    /// Routes to QC under the keyword router
    pub fn surface_scratch() -> &'static str {
        "Deep scratch and rust on the coil surface"
    }

    /// Routes to QA under the keyword router
    pub fn certificate_mismatch() -> &'static str {
        "Mill certificate chemical values do not match the COA"
    }

    /// Routes to MCS under the keyword router
    pub fn late_delivery() -> &'static str {
        "Truck delivery was late by three days"
    }

    /// Matches no keyword
    pub fn unmatched() -> &'static str {
        "Please call me back"
    }
}

/// Fixture for lot identifiers
pub struct LotFixtures;

impl LotFixtures {
    pub fn lot(n: u32) -> String {
        format!("LOT-2026-{:04}", n)
    }
}

/// Fixture for timestamps
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// A minute-aligned submission time
    pub fn submitted_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 15, 0)
            .single()
            .expect("valid fixture timestamp")
    }
}
