//! Report export
//!
//! Renders cases in the same layout as the case file so a downloaded report
//! can be opened next to, or dropped in place of, the live store.

use domain_cases::Case;

use crate::error::StoreError;
use crate::schema::{write_records, CaseRecord};

/// Renders `cases` as UTF-8 CSV with a header row
pub fn export_csv(cases: &[Case]) -> Result<Vec<u8>, StoreError> {
    let records: Vec<CaseRecord> = cases.iter().map(CaseRecord::from_case).collect();
    write_records(&records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{read_records, COLUMNS};
    use domain_cases::Department;

    #[test]
    fn test_export_has_header_and_rows() {
        let cases = vec![
            Case::open("LOT-1", "dent", Department::new("QC").unwrap(), 5),
            Case::open("LOT-2", "label \"missing\", again", Department::new("QA").unwrap(), 1),
        ];
        let bytes = export_csv(&cases).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();

        assert!(text.starts_with(&COLUMNS.join(",")));
        let (records, report) = read_records(&bytes).unwrap();
        assert!(!report.changed());
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].complaint, "label \"missing\", again");
    }

    #[test]
    fn test_export_of_nothing_is_header_only() {
        let bytes = export_csv(&[]).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap().lines().count(), 1);
    }
}
