//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! claim tracking test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built departments, lots and complaints
//! - `builders`: Builders for cases and wired-up workflows
//! - `storage`: Temporary CSV stores
//! - `assertions`: Custom assertion helpers for cases
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod storage;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use storage::*;
pub use assertions::*;
pub use generators::*;
