// Application Layer - Use Cases and Business Logic

pub mod position;
pub mod retry;
pub mod waitlist;

// Re-exports
pub use position::{PositionCalculator, Standing};
pub use retry::{CasRetryPolicy, RetryDecision};
pub use waitlist::{
    EngineConfig, JoinReceipt, OwnerView, ParticipantView, PositionedEntry, QueueSummary,
    QueueWaitlistEngine, Snapshot,
};
