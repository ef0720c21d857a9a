//! Dashboard counts

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::case::Case;

/// Aggregate view over every case in the store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseSummary {
    pub total: usize,
    pub closed: usize,
    pub active: usize,
    /// Share of cases closed, in percent
    pub resolution_rate_pct: f64,
    pub by_department: BTreeMap<String, usize>,
    pub by_status: BTreeMap<String, usize>,
}

impl CaseSummary {
    pub fn from_cases(cases: &[Case]) -> Self {
        let total = cases.len();
        let closed = cases.iter().filter(|c| c.is_closed()).count();

        let mut by_department = BTreeMap::new();
        let mut by_status = BTreeMap::new();
        for case in cases {
            *by_department.entry(case.department.to_string()).or_insert(0) += 1;
            *by_status.entry(case.status.to_string()).or_insert(0) += 1;
        }

        let resolution_rate_pct = if total > 0 {
            closed as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        Self {
            total,
            closed,
            active: total - closed,
            resolution_rate_pct,
            by_department,
            by_status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::CaseStatus;
    use crate::department::Department;

    #[test]
    fn test_empty_summary() {
        let summary = CaseSummary::from_cases(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.resolution_rate_pct, 0.0);
    }

    #[test]
    fn test_counts() {
        let qc = Department::new("QC").unwrap();
        let mut closed = Case::open("LOT-2", "crack", qc.clone(), 5);
        closed.status = CaseStatus::Closed;
        let cases = vec![Case::open("LOT-1", "dent", qc, 5), closed];

        let summary = CaseSummary::from_cases(&cases);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.closed, 1);
        assert_eq!(summary.active, 1);
        assert_eq!(summary.resolution_rate_pct, 50.0);
        assert_eq!(summary.by_department.get("QC"), Some(&2));
        assert_eq!(summary.by_status.get("Case Closed"), Some(&1));
    }
}
