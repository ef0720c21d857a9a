//! Storage Test Utilities
//!
//! Temporary CSV-backed stores for adapter and API tests. The backing
//! directory is removed when the returned guard drops.

use std::path::PathBuf;

use infra_store::{CsvCaseStore, StoreError};
use tempfile::TempDir;

/// Default file name for test stores
pub const TEST_STORE_FILE: &str = "claims.csv";

/// A CSV store living in its own temporary directory
pub struct TempCsvStore {
    pub store: CsvCaseStore,
    pub path: PathBuf,
    _dir: TempDir,
}

impl TempCsvStore {
    /// Opens an empty store
    pub async fn new() -> Result<Self, StoreError> {
        Self::with_contents(None).await
    }

    /// Writes `csv` to the store file before opening it
    pub async fn with_contents(csv: Option<&str>) -> Result<Self, StoreError> {
        let dir = TempDir::new()?;
        let path = dir.path().join(TEST_STORE_FILE);
        if let Some(csv) = csv {
            tokio::fs::write(&path, csv).await?;
        }
        let store = CsvCaseStore::open(&path).await?;
        Ok(Self {
            store,
            path,
            _dir: dir,
        })
    }

    /// Opens a second store over the same file
    pub async fn reopen(&self) -> Result<CsvCaseStore, StoreError> {
        CsvCaseStore::open(&self.path).await
    }

    /// Raw file contents
    pub async fn contents(&self) -> Result<String, StoreError> {
        Ok(tokio::fs::read_to_string(&self.path).await?)
    }
}
