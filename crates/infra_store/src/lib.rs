//! Infrastructure Storage Layer
//!
//! This crate persists cases in a single delimited-text file that operators
//! can open in a spreadsheet, download as a report, or edit by hand.
//!
//! # Architecture
//!
//! [`CsvCaseStore`] implements `domain_cases::CaseStorePort`. The domain
//! never sees rows or columns; [`schema`] owns the mapping in both
//! directions.
//!
//! # Layout
//!
//! One header row, one row per case, in insertion order. The history of a
//! case is a single cell of `[YYYY-MM-DD HH:MM] note` entries joined with
//! ` || `. Files written by older versions are migrated when opened.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_store::CsvCaseStore;
//! use std::sync::Arc;
//!
//! let store = CsvCaseStore::open("data/claims.csv").await?;
//! let port: Arc<dyn CaseStorePort> = Arc::new(store);
//! ```

pub mod csv_store;
pub mod error;
pub mod export;
pub mod schema;

pub use csv_store::CsvCaseStore;
pub use error::StoreError;
pub use export::export_csv;
pub use schema::{CaseRecord, MigrationReport, COLUMNS};
