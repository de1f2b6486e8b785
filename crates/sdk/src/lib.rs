//! Queueline SDK - Rust Client Library
//!
//! Typed client for the Queueline waitlist daemon.
//!
//! # Example
//!
//! ```no_run
//! use queueline_sdk::QueuelineClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect to daemon
//!     let client = QueuelineClient::connect("http://127.0.0.1:9630").await?;
//!
//!     // Join a queue
//!     let receipt = client.join("barber-shop", "alice").await?;
//!
//!     println!(
//!         "Position {} (about {} minutes)",
//!         receipt.standing.position, receipt.standing.estimated_wait_minutes
//!     );
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::QueuelineClient;
pub use error::{Result, SdkError};
pub use types::{
    JoinReceipt, OwnerSnapshot, ParticipantSnapshot, PositionedEntry, QueueSettings, QueueStatus,
    QueueSummary, RegisterQueueRequest, RegisterQueueResponse, RemovalReason, Standing,
};
