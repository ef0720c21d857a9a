//! Core Kernel - Foundational types shared by the claim tracking crates
//!
//! This crate provides the building blocks used across the workspace:
//! - Strongly-typed identifiers
//! - The port error taxonomy and adapter health types
//! - Retry policy with explicit exponential backoff for external collaborators

pub mod identifiers;
pub mod error;
pub mod ports;
pub mod retry;

pub use identifiers::{CaseId, RequestId};
pub use error::CoreError;
pub use ports::{
    PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth,
    AdapterType, CircuitBreakerConfig, OperationMetadata,
};
pub use retry::RetryPolicy;
