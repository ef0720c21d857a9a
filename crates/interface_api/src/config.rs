//! API configuration

use std::collections::HashMap;

use core_kernel::{CoreError, RetryPolicy};
use domain_cases::{CaseStoreConfig, Department, DepartmentDirectory};
use serde::{Deserialize, Serialize};

/// Where cases are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// The CSV file at `store_path`
    Csv,
    /// Process memory; lost on restart
    Memory,
}

/// API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    pub storage_backend: StorageBackend,
    /// Case file used by the CSV backend
    pub store_path: String,
    /// Every department that can hold a case
    pub departments: Vec<String>,
    /// The department that closes cases and may override routing
    pub decision_department: String,
    /// Estimated resolution days per department
    pub sla_days: HashMap<String, u32>,
    /// Estimate for departments missing from `sla_days`
    pub default_sla_days: u32,
    pub reject_duplicate_open_lots: bool,
    /// Attempts per complaint classification
    pub router_max_attempts: u32,
    pub router_base_delay_ms: u64,
    /// Log level
    pub log_level: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            storage_backend: StorageBackend::Csv,
            store_path: "data/tracking_db.csv".to_string(),
            departments: vec!["QC".to_string(), "QA".to_string(), "MCS".to_string()],
            decision_department: "MCS".to_string(),
            sla_days: HashMap::from([
                ("QC".to_string(), 5),
                ("QA".to_string(), 1),
                ("MCS".to_string(), 2),
            ]),
            default_sla_days: 3,
            reject_duplicate_open_lots: false,
            router_max_attempts: 3,
            router_base_delay_ms: 500,
            log_level: "info".to_string(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment, on top of the defaults
    ///
    /// `API_DEPARTMENTS` takes a comma-separated list.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Config::try_from(&ApiConfig::default())?)
            .add_source(
                config::Environment::with_prefix("API")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("departments"),
            )
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Builds the department directory, rejecting inconsistent settings
    pub fn directory(&self) -> Result<DepartmentDirectory, CoreError> {
        let departments = self
            .departments
            .iter()
            .map(|label| Department::new(label))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CoreError::configuration(e.to_string()))?;
        if departments.is_empty() {
            return Err(CoreError::configuration("at least one department is required"));
        }

        let decision = Department::new(&self.decision_department)
            .map_err(|e| CoreError::configuration(e.to_string()))?;
        let mut directory = DepartmentDirectory::new(departments, decision, self.default_sla_days)
            .map_err(|e| CoreError::configuration(e.to_string()))?;

        for (label, days) in &self.sla_days {
            let department = Department::new(label).map_err(|e| CoreError::configuration(e.to_string()))?;
            directory = directory.with_sla_days(department, *days);
        }
        Ok(directory)
    }

    pub fn store_config(&self) -> CaseStoreConfig {
        CaseStoreConfig {
            reject_duplicate_open_lots: self.reject_duplicate_open_lots,
        }
    }

    pub fn router_retry(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.router_max_attempts.max(1),
            base_delay_ms: self.router_base_delay_ms,
            ..RetryPolicy::default()
        }
    }

    /// Checks settings that would otherwise fail on first use
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(CoreError::configuration("jwt_secret must not be empty"));
        }
        if self.storage_backend == StorageBackend::Csv && self.store_path.trim().is_empty() {
            return Err(CoreError::configuration("store_path is required for the csv backend"));
        }
        self.directory().map(|_| ())
    }
}
