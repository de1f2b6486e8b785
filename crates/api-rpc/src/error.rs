//! RPC Error Types
//!
//! Maps application errors to JSON-RPC error codes. Every waitlist failure
//! kind gets its own code so a client can tell "queue full" from
//! "already joined" from "transient, please retry".

use crate::types::RpcErrorData;
use jsonrpsee::types::ErrorObjectOwned;
use queueline_core::domain::DomainError;
use queueline_core::error::AppError;
use tracing::{debug, error};

/// RPC Error Codes
pub mod code {
    pub const VALIDATION_ERROR: i32 = 4000;
    pub const NOT_FOUND: i32 = 4001;
    pub const CONFLICT: i32 = 4002;
    pub const THROTTLED: i32 = 4003;
    pub const CONCURRENCY_EXHAUSTED: i32 = 4090;
    pub const QUEUE_FULL: i32 = 4101;
    pub const ALREADY_JOINED: i32 = 4102;
    pub const NOT_IN_QUEUE: i32 = 4103;
    pub const QUEUE_CLOSED: i32 = 4104;
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const DB_ERROR: i32 = 5001;
}

/// Convert AppError to JSON-RPC ErrorObject
pub fn to_rpc_error(err: AppError) -> ErrorObjectOwned {
    let retryable = err.is_retryable();

    let (code, kind) = match &err {
        AppError::Domain(domain) => match domain {
            DomainError::AlreadyJoined { .. } => (code::ALREADY_JOINED, "already_joined"),
            DomainError::NotInQueue { .. } => (code::NOT_IN_QUEUE, "not_in_queue"),
            DomainError::QueueFull { .. } => (code::QUEUE_FULL, "queue_full"),
            DomainError::QueueClosed { .. } => (code::QUEUE_CLOSED, "queue_closed"),
            DomainError::ConcurrencyExhausted { .. } => {
                (code::CONCURRENCY_EXHAUSTED, "concurrency_exhausted")
            }
            // Never expected here: the engine consumes conflicts
            DomainError::VersionConflict { .. } => (code::CONFLICT, "version_conflict"),
            DomainError::QueueNotFound(_) => (code::NOT_FOUND, "queue_not_found"),
            DomainError::ValidationError(_) => (code::VALIDATION_ERROR, "validation"),
        },
        AppError::Validation(_) => (code::VALIDATION_ERROR, "validation"),
        AppError::Serialization(_) => (code::VALIDATION_ERROR, "serialization"),
        AppError::Conflict(_) => (code::CONFLICT, "conflict"),
        AppError::Database(_) => (code::DB_ERROR, "database"),
        AppError::Config(_) => (code::INTERNAL_ERROR, "config"),
        AppError::Internal(_) => (code::INTERNAL_ERROR, "internal"),
    };

    let message = match &err {
        AppError::Domain(domain) => domain.to_string(),
        other => other.to_string(),
    };

    if code >= code::INTERNAL_ERROR {
        error!(code = code, error = %message, "RPC request failed");
    } else {
        debug!(code = code, kind = kind, error = %message, "RPC request rejected");
    }

    ErrorObjectOwned::owned(
        code,
        message,
        Some(RpcErrorData {
            kind: kind.to_string(),
            retryable,
        }),
    )
}

/// Error returned when the rate limiter denies a mutating call
pub fn throttled() -> ErrorObjectOwned {
    ErrorObjectOwned::owned(
        code::THROTTLED,
        "Rate limit exceeded. Please slow down.",
        Some(RpcErrorData {
            kind: "throttled".to_string(),
            retryable: true,
        }),
    )
}
