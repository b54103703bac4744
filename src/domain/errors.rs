//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Resolved start is not before end, or a required bound is missing.
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    /// Record store or directory unreachable or erroring. Never retried here.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Canonical-name collision on entity creation. Callers re-resolve the existing entity.
    #[error("Duplicate {entity}: {key}")]
    DuplicateKey { entity: &'static str, key: String },

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Prompt failed: {0}")]
    Prompt(String),
}

impl DomainError {
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, DomainError::DuplicateKey { .. })
    }
}
