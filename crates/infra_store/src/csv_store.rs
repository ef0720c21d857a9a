//! CSV Case Store Adapter
//!
//! File-backed implementation of `CaseStorePort`.
//!
//! # Concurrency
//!
//! Every handle opened on the same file shares one mutex, looked up by
//! canonical path. An operation takes it, reads the whole file, and (for
//! writes) renders the new contents to a uniquely named sibling temp file
//! that is then persisted over the original. Readers never see a
//! half-written file.
//!
//! Writes also compare the file's length and modification time with what
//! was read. A file replaced behind the store's back (another process, a
//! hand edit) fails the write with `PortError::Conflict` instead of being
//! overwritten. `save` additionally compares the stored `Revision` with the
//! one the caller read.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use core_kernel::{
    AdapterHealth, AdapterType, CaseId, DomainPort, HealthCheckResult, HealthCheckable,
    OperationMetadata, PortError,
};
use domain_cases::{Case, CaseQuery, CaseStorePort};

use crate::error::StoreError;
use crate::schema::{read_records, write_records, CaseRecord};

const ADAPTER_ID: &str = "csv-case-store";

/// One writer lock per case file in this process
static FILE_LOCKS: Lazy<std::sync::Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
    Lazy::new(|| std::sync::Mutex::new(HashMap::new()));

fn lock_for(canonical: &Path) -> Arc<Mutex<()>> {
    let mut locks = FILE_LOCKS.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    locks
        .entry(canonical.to_path_buf())
        .or_insert_with(|| Arc::new(Mutex::new(())))
        .clone()
}

/// What the file looked like when it was read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    len: u64,
    modified: Option<SystemTime>,
}

/// Cases read under the lock, with the stamp writes are checked against
struct Snapshot {
    cases: Vec<Case>,
    stamp: Option<FileStamp>,
}

/// CSV-backed implementation of the CaseStorePort trait
#[derive(Debug, Clone)]
pub struct CsvCaseStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl CsvCaseStore {
    /// Opens the store at `path`, creating or migrating the file as needed
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => parent.to_path_buf(),
            None => PathBuf::from("."),
        };
        tokio::fs::create_dir_all(&parent).await?;

        let file_name = path
            .file_name()
            .ok_or_else(|| StoreError::Io(std::io::Error::other(format!(
                "{} does not name a file",
                path.display()
            ))))?;
        let canonical = tokio::fs::canonicalize(&parent).await?.join(file_name);

        let store = Self {
            lock: lock_for(&canonical),
            path: canonical,
        };
        store.migrate().await?;
        Ok(store)
    }

    /// Canonical location of the case file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;

        let stamp = self.stamp().await?;
        let bytes = self.read_bytes().await?;
        let (records, report) = read_records(&bytes)?;

        // Refuse to start, and leave the file untouched, if any row is unusable
        to_cases(records.clone())?;

        if report.changed() {
            info!(
                path = %self.path.display(),
                created = report.created,
                added_columns = ?report.added_columns,
                handlers_backfilled = report.handlers_backfilled,
                ids_assigned = report.ids_assigned,
                dates_backfilled = report.dates_backfilled,
                "Case file migrated"
            );
            self.write_bytes(stamp, write_records(&records)?).await?;
        }
        Ok(())
    }

    async fn stamp(&self) -> Result<Option<FileStamp>, StoreError> {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) => Ok(Some(FileStamp {
                len: meta.len(),
                modified: meta.modified().ok(),
            })),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn read_bytes(&self) -> Result<Vec<u8>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Replaces the file with `bytes` unless it changed since `read_stamp`
    async fn write_bytes(&self, read_stamp: Option<FileStamp>, bytes: Vec<u8>) -> Result<(), StoreError> {
        let current = self.stamp().await?;
        if current != read_stamp {
            return Err(StoreError::Conflict(format!(
                "{} changed on disk since it was read",
                self.path.display()
            )));
        }

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            let mut tmp = NamedTempFile::new_in(dir)?;
            tmp.write_all(&bytes)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Io(std::io::Error::other(e)))?
    }

    /// Loads every case; callers must hold the lock
    async fn load(&self) -> Result<Snapshot, StoreError> {
        let stamp = self.stamp().await?;
        let bytes = self.read_bytes().await?;
        let (records, _) = read_records(&bytes)?;
        Ok(Snapshot {
            cases: to_cases(records)?,
            stamp,
        })
    }

    /// Replaces the file contents; callers must hold the lock
    async fn persist(&self, read_stamp: Option<FileStamp>, cases: &[Case]) -> Result<(), StoreError> {
        let records: Vec<CaseRecord> = cases.iter().map(CaseRecord::from_case).collect();
        self.write_bytes(read_stamp, write_records(&records)?).await
    }
}

fn to_cases(records: Vec<CaseRecord>) -> Result<Vec<Case>, StoreError> {
    records
        .into_iter()
        .enumerate()
        .map(|(i, record)| record.into_case(i + 2))
        .collect()
}

impl DomainPort for CsvCaseStore {}

#[async_trait]
impl HealthCheckable for CsvCaseStore {
    /// Checks that the file can be read and parsed
    async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();
        let result = {
            let _guard = self.lock.lock().await;
            self.load().await.map(|snapshot| snapshot.cases)
        };
        let latency_ms = start.elapsed().as_millis() as u64;

        let (status, message) = match result {
            Ok(cases) => (AdapterHealth::Healthy, format!("{} cases on file", cases.len())),
            Err(e) => (AdapterHealth::Unhealthy, format!("Case file error: {}", e)),
        };

        HealthCheckResult {
            adapter_id: ADAPTER_ID.to_string(),
            adapter_type: AdapterType::File,
            status,
            latency_ms,
            message: Some(message),
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl CaseStorePort for CsvCaseStore {
    #[instrument(skip(self, case, _metadata), fields(case_id = %case.id, lot_id = %case.lot_id))]
    async fn insert(
        &self,
        case: Case,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Case, PortError> {
        let _guard = self.lock.lock().await;

        let Snapshot { mut cases, stamp } = self.load().await?;
        if cases.iter().any(|c| c.id == case.id) {
            return Err(PortError::Conflict {
                message: format!("case {} already exists", case.id),
            });
        }
        cases.push(case.clone());
        self.persist(stamp, &cases).await?;

        debug!(rows = cases.len(), "Case appended");
        Ok(case)
    }

    async fn get(&self, id: CaseId) -> Result<Case, PortError> {
        let _guard = self.lock.lock().await;

        self.load()
            .await?
            .cases
            .into_iter()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()).into())
    }

    async fn find_latest_by_lot(&self, lot_id: &str) -> Result<Option<Case>, PortError> {
        let _guard = self.lock.lock().await;

        Ok(self
            .load()
            .await?
            .cases
            .into_iter()
            .rev()
            .find(|c| c.lot_id == lot_id))
    }

    #[instrument(skip(self, case, metadata), fields(case_id = %case.id))]
    async fn save(
        &self,
        mut case: Case,
        expected_revision: u64,
        metadata: Option<OperationMetadata>,
    ) -> Result<Case, PortError> {
        let _guard = self.lock.lock().await;

        let Snapshot { mut cases, stamp } = self.load().await?;
        let slot = cases
            .iter_mut()
            .find(|c| c.id == case.id)
            .ok_or_else(|| StoreError::NotFound(case.id.to_string()))?;

        if slot.revision != expected_revision {
            return Err(PortError::stale_revision(case.id, expected_revision, slot.revision));
        }

        case.revision = expected_revision + 1;
        *slot = case.clone();
        self.persist(stamp, &cases).await?;

        debug!(
            revision = case.revision,
            initiated_by = ?metadata.as_ref().and_then(|m| m.initiated_by.as_deref()),
            "Case saved"
        );
        Ok(case)
    }

    async fn list(&self, query: CaseQuery) -> Result<Vec<Case>, PortError> {
        let _guard = self.lock.lock().await;

        Ok(self
            .load()
            .await?
            .cases
            .into_iter()
            .filter(|c| query.matches(c))
            .collect())
    }

    async fn clear(&self) -> Result<usize, PortError> {
        let _guard = self.lock.lock().await;

        let Snapshot { cases, stamp } = self.load().await?;
        self.persist(stamp, &[]).await?;
        let removed = cases.len();
        info!(removed, path = %self.path.display(), "Case file cleared");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_handles_on_one_file_share_a_lock() {
        let dir = TempDir::new().unwrap();
        let a = CsvCaseStore::open(dir.path().join("claims.csv")).await.unwrap();
        let b = CsvCaseStore::open(dir.path().join(".").join("claims.csv")).await.unwrap();
        let other = CsvCaseStore::open(dir.path().join("other.csv")).await.unwrap();

        assert!(Arc::ptr_eq(&a.lock, &b.lock));
        assert!(!Arc::ptr_eq(&a.lock, &other.lock));
    }

    #[tokio::test]
    async fn test_write_over_a_file_changed_on_disk_is_a_conflict() {
        let dir = TempDir::new().unwrap();
        let store = CsvCaseStore::open(dir.path().join("claims.csv")).await.unwrap();

        let _guard = store.lock.lock().await;
        let snapshot = store.load().await.unwrap();
        let mut edited = tokio::fs::read(store.path()).await.unwrap();
        edited.extend_from_slice(b"\n");
        tokio::fs::write(store.path(), &edited).await.unwrap();

        let result = store.persist(snapshot.stamp, &snapshot.cases).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
        assert_eq!(tokio::fs::read(store.path()).await.unwrap(), edited);
    }

    #[tokio::test]
    async fn test_writes_leave_no_temp_files_behind() {
        let dir = TempDir::new().unwrap();
        let store = CsvCaseStore::open(dir.path().join("claims.csv")).await.unwrap();
        store.clear().await.unwrap();

        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, vec!["claims.csv".to_string()]);
    }
}
