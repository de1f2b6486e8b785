// Queue Domain Model (owned by the metadata collaborator, referenced here)

use super::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Queue identifier
pub type QueueId = String;

/// Queue Status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    Open,
    Paused,
    Closed,
}

impl QueueStatus {
    pub fn accepts_joins(&self) -> bool {
        matches!(self, QueueStatus::Open)
    }
}

impl std::fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueStatus::Open => write!(f, "open"),
            QueueStatus::Paused => write!(f, "paused"),
            QueueStatus::Closed => write!(f, "closed"),
        }
    }
}

impl FromStr for QueueStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "open" => Ok(QueueStatus::Open),
            "paused" => Ok(QueueStatus::Paused),
            "closed" => Ok(QueueStatus::Closed),
            other => Err(DomainError::ValidationError(format!(
                "Unknown queue status: {}",
                other
            ))),
        }
    }
}

/// The queue metadata the waitlist engine depends on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSettings {
    pub id: QueueId,
    /// Maximum number of participants waiting at once
    pub capacity: u32,
    /// Estimated per-participant service time, in minutes
    pub estimated_service_minutes: u32,
    pub status: QueueStatus,
}

impl QueueSettings {
    /// Create settings for an open queue
    ///
    /// Fails when capacity or service time is zero.
    pub fn new(
        id: impl Into<String>,
        capacity: u32,
        estimated_service_minutes: u32,
    ) -> Result<Self> {
        let settings = Self {
            id: id.into(),
            capacity,
            estimated_service_minutes,
            status: QueueStatus::Open,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn with_status(mut self, status: QueueStatus) -> Self {
        self.status = status;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "Queue id cannot be empty".to_string(),
            ));
        }
        if self.capacity == 0 {
            return Err(DomainError::ValidationError(
                "Capacity must be a positive integer".to_string(),
            ));
        }
        if self.estimated_service_minutes == 0 {
            return Err(DomainError::ValidationError(
                "Estimated service time must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }
}
