//! Case file schema
//!
//! Column layout, row <-> case mapping and the migration applied to files
//! written by older versions.
//!
//! Older files may lack columns, carry `System` or an empty cell as the
//! handler of a case that was never picked up, and have no `Case_ID` or
//! `Revision`. [`read_records`] repairs all of that and reports what it did
//! so the caller can decide whether to rewrite the file.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use serde::{Deserialize, Serialize};

use core_kernel::CaseId;
use domain_cases::{ActionHistory, Case, CaseStatus, Department, FinalDecision, Handler};

use crate::error::StoreError;

/// Header row, in file order
pub const COLUMNS: [&str; 12] = [
    "Lot_ID",
    "Date",
    "Complaint",
    "Department",
    "Status",
    "Estimated_Days",
    "Current_Handler",
    "Action_History",
    "Final_Decision",
    "Resolution_Note",
    "Case_ID",
    "Revision",
];

/// Format of the `Date` column
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Placeholder handlers written before routing assigned a real one
const PLACEHOLDER_HANDLERS: [&str; 3] = ["", "System", "nan"];

/// One row of the case file, as text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRecord {
    #[serde(rename = "Lot_ID")]
    pub lot_id: String,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Complaint")]
    pub complaint: String,
    #[serde(rename = "Department")]
    pub department: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Estimated_Days")]
    pub estimated_days: String,
    #[serde(rename = "Current_Handler")]
    pub current_handler: String,
    #[serde(rename = "Action_History")]
    pub action_history: String,
    #[serde(rename = "Final_Decision")]
    pub final_decision: String,
    #[serde(rename = "Resolution_Note")]
    pub resolution_note: String,
    #[serde(rename = "Case_ID")]
    pub case_id: String,
    #[serde(rename = "Revision")]
    pub revision: String,
}

impl CaseRecord {
    pub fn from_case(case: &Case) -> Self {
        Self {
            lot_id: case.lot_id.clone(),
            date: case.created_at.format(DATE_FORMAT).to_string(),
            complaint: case.complaint.clone(),
            department: case.department.to_string(),
            status: case.status.to_string(),
            estimated_days: case.estimated_days.to_string(),
            current_handler: case.current_handler.to_string(),
            action_history: case.action_history.render(),
            final_decision: case
                .final_decision
                .map(|d| d.to_string())
                .unwrap_or_default(),
            resolution_note: case.resolution_note.clone().unwrap_or_default(),
            case_id: case.id.to_string(),
            revision: case.revision.to_string(),
        }
    }

    /// Converts the row into a case; `row` is the line number for error messages
    pub fn into_case(self, row: usize) -> Result<Case, StoreError> {
        let lot_id = self.lot_id.trim().to_string();
        if lot_id.is_empty() {
            return Err(StoreError::malformed(row, "Lot_ID is empty"));
        }

        let department = Department::new(&self.department)
            .map_err(|_| StoreError::malformed(row, "Department is empty"))?;
        let created_at = parse_date(&self.date).ok_or_else(|| {
            StoreError::malformed(row, format!("unreadable Date '{}'", self.date))
        })?;

        let status = match CaseStatus::from_str(&self.status) {
            Ok(status) => status,
            Err(never) => match never {},
        };
        let current_handler = Handler::parse_stored(&self.current_handler)
            .unwrap_or_else(|| Handler::Department(department.clone()));

        let final_decision = match blank_to_none(&self.final_decision) {
            Some(raw) => Some(FinalDecision::from_str(raw).map_err(|e| StoreError::malformed(row, e.to_string()))?),
            None => None,
        };

        let id = CaseId::from_str(self.case_id.trim())
            .map_err(|e| StoreError::malformed(row, format!("bad Case_ID: {}", e)))?;

        Ok(Case {
            id,
            lot_id,
            created_at,
            complaint: self.complaint,
            department,
            status,
            estimated_days: parse_days(&self.estimated_days)
                .ok_or_else(|| StoreError::malformed(row, format!("bad Estimated_Days '{}'", self.estimated_days)))?,
            current_handler,
            action_history: ActionHistory::parse(&self.action_history, created_at),
            final_decision,
            resolution_note: blank_to_none(&self.resolution_note).map(str::to_string),
            revision: parse_revision(&self.revision)
                .ok_or_else(|| StoreError::malformed(row, format!("bad Revision '{}'", self.revision)))?,
        })
    }
}

/// What [`read_records`] had to repair
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// The file had no header row at all
    pub created: bool,
    pub added_columns: Vec<String>,
    pub handlers_backfilled: usize,
    pub ids_assigned: usize,
    pub dates_backfilled: usize,
}

impl MigrationReport {
    /// True if the repaired records differ from what is on disk
    pub fn changed(&self) -> bool {
        self.created
            || !self.added_columns.is_empty()
            || self.handlers_backfilled > 0
            || self.ids_assigned > 0
            || self.dates_backfilled > 0
    }
}

/// Parses file contents into records, repairing legacy rows on the way
pub fn read_records(bytes: &[u8]) -> Result<(Vec<CaseRecord>, MigrationReport), StoreError> {
    let mut report = MigrationReport::default();

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers = rdr.headers()?.clone();
    if headers.is_empty() {
        report.created = true;
        return Ok((Vec::new(), report));
    }

    let header_map = build_header_map(&headers);
    report.added_columns = COLUMNS
        .iter()
        .filter(|c| !header_map.contains_key(**c))
        .map(|c| c.to_string())
        .collect();

    let mut records = Vec::new();
    for result in rdr.records() {
        let raw = result?;
        let mut record = CaseRecord {
            lot_id: field(&raw, &header_map, "Lot_ID"),
            date: field(&raw, &header_map, "Date"),
            complaint: field(&raw, &header_map, "Complaint"),
            department: field(&raw, &header_map, "Department"),
            status: field(&raw, &header_map, "Status"),
            estimated_days: field(&raw, &header_map, "Estimated_Days"),
            current_handler: field(&raw, &header_map, "Current_Handler"),
            action_history: field(&raw, &header_map, "Action_History"),
            final_decision: field(&raw, &header_map, "Final_Decision"),
            resolution_note: field(&raw, &header_map, "Resolution_Note"),
            case_id: field(&raw, &header_map, "Case_ID"),
            revision: field(&raw, &header_map, "Revision"),
        };

        if PLACEHOLDER_HANDLERS.contains(&record.current_handler.trim())
            && !record.department.trim().is_empty()
        {
            record.current_handler = record.department.trim().to_string();
            report.handlers_backfilled += 1;
        }
        if record.case_id.trim().is_empty() {
            record.case_id = CaseId::new_v7().to_string();
            report.ids_assigned += 1;
        }
        if record.date.trim().is_empty() {
            let first_entry = ActionHistory::parse(&record.action_history, Utc::now())
                .entries()
                .first()
                .map(|e| e.at)
                .unwrap_or_else(Utc::now);
            record.date = first_entry.format(DATE_FORMAT).to_string();
            report.dates_backfilled += 1;
        }

        records.push(record);
    }

    Ok((records, report))
}

/// Renders records with a header row, even when there are none
pub fn write_records(records: &[CaseRecord]) -> Result<Vec<u8>, StoreError> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(Vec::new());
    wtr.write_record(COLUMNS)?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.into_inner()
        .map_err(|e| StoreError::Serialization(e.to_string()))
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().trim_start_matches('\u{feff}').to_string(), i))
        .collect()
}

fn field(record: &StringRecord, header_map: &HashMap<String, usize>, column: &str) -> String {
    header_map
        .get(column)
        .and_then(|&i| record.get(i))
        .unwrap_or_default()
        .to_string()
}

fn blank_to_none(raw: &str) -> Option<&str> {
    match raw.trim() {
        "" | "nan" => None,
        value => Some(value),
    }
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, DATE_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|dt| dt.and_utc())
}

/// Accepts `5` and the `5.0` spreadsheets tend to write back
fn parse_days(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(0);
    }
    raw.parse::<u32>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|d| d.is_finite() && *d >= 0.0)
            .map(|d| d as u32)
    })
}

fn parse_revision(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if raw.is_empty() {
        Some(0)
    } else {
        raw.parse().ok()
    }
}
