// Queue Metadata Ports (Interface)

use crate::domain::{QueueSettings, QueueStatus};
use crate::error::Result;
use async_trait::async_trait;

/// Read access to the queue metadata the engine depends on
#[async_trait]
pub trait QueueDirectory: Send + Sync {
    /// Look up capacity, service time and status
    ///
    /// # Errors
    /// - `DomainError::QueueNotFound` if no such queue is registered
    async fn get_queue(&self, queue_id: &str) -> Result<QueueSettings>;

    /// All registered queues (public queue list)
    async fn list_queues(&self) -> Result<Vec<QueueSettings>>;
}

/// Queue lifecycle operations owned by the metadata collaborator
#[async_trait]
pub trait QueueRegistry: QueueDirectory {
    /// Register a queue together with its empty waitlist (version 0)
    ///
    /// # Errors
    /// - `AppError::Validation` if capacity or service time is zero
    /// - `AppError::Conflict` if the queue id is already taken
    async fn register(&self, settings: &QueueSettings) -> Result<()>;

    /// Change the queue status (does not touch the waitlist or its version)
    async fn set_status(&self, queue_id: &str, status: QueueStatus) -> Result<()>;
}
