// Port Layer - Interfaces for external collaborators

pub mod change_notifier;
pub mod id_provider; // For deterministic testing
pub mod queue_directory;
pub mod time_provider;
pub mod waitlist_store;

// Re-exports
pub use change_notifier::{
    BroadcastChangeNotifier, ChangeNotifier, ChangeStream, WaitlistSubscription,
};
pub use id_provider::IdProvider;
pub use queue_directory::{QueueDirectory, QueueRegistry};
pub use time_provider::TimeProvider;
pub use waitlist_store::{WaitlistStore, WriteGuard};
