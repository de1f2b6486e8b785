// Domain Error Types

use super::waitlist::Version;
use thiserror::Error;

/// Waitlist business-rule and concurrency failures
///
/// Every variant except `VersionConflict` is returned to the caller unchanged.
/// `VersionConflict` is raised by stores on a lost compare-and-swap and is
/// consumed by the engine's retry loop.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Participant {participant_id} already joined this queue")]
    AlreadyJoined { participant_id: String },

    #[error("Participant {participant_id} is not in this queue")]
    NotInQueue { participant_id: String },

    #[error("Queue is full (capacity {capacity})")]
    QueueFull { capacity: u32 },

    #[error("Queue is not open (status: {status})")]
    QueueClosed { status: String },

    #[error("Version conflict: expected {expected}, found {actual}")]
    VersionConflict { expected: Version, actual: Version },

    #[error("Gave up after {attempts} conflicting attempts, please retry")]
    ConcurrencyExhausted { attempts: u32 },

    #[error("Queue not found: {0}")]
    QueueNotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
