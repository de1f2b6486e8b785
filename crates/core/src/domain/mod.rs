// Domain Layer - Pure business logic and entities

pub mod entry;
pub mod error;
pub mod event;
pub mod queue;
pub mod waitlist;

// Re-exports
pub use entry::{ParticipantId, WaitlistEntry};
pub use error::DomainError;
pub use event::{ChangeKind, RemovalReason, WaitlistChanged};
pub use queue::{QueueId, QueueSettings, QueueStatus};
pub use waitlist::{Version, VersionedWaitlist, Waitlist};
