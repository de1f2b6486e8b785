// Central Error Type for the Application

use crate::domain::DomainError;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Domain error carried by this error, if any
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            AppError::Domain(e) => Some(e),
            _ => None,
        }
    }

    /// True for a lost compare-and-swap race (caught and retried by the engine)
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, AppError::Domain(DomainError::VersionConflict { .. }))
    }

    /// True when the caller may safely repeat the same request
    ///
    /// Only contention-driven failures qualify; business-rule rejections
    /// (queue full, already joined, ...) will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Domain(DomainError::ConcurrencyExhausted { .. }) => true,
            AppError::Database(msg) => msg.contains("SQLITE_BUSY"),
            _ => false,
        }
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

// Note: sqlx::Error conversion is handled in infra-sqlite crate
// by converting to AppError::Database(String)
