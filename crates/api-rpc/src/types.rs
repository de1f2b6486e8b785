//! RPC Request/Response Types
//!
//! Defines the JSON-RPC method parameters and results. Read models come
//! straight from the engine (`JoinReceipt`, `Snapshot`, `QueueSummary`) so
//! the wire format and the engine never drift apart.

use queueline_core::application::Snapshot;
use queueline_core::domain::{QueueStatus, RemovalReason, WaitlistChanged};
use serde::{Deserialize, Serialize};

pub use queueline_core::application::{JoinReceipt, QueueSummary};

/// waitlist.join.v1 - Join the tail of a queue (response: `JoinReceipt`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRequest {
    pub queue_id: String,
    pub participant_id: String,
}

/// waitlist.leave.v1 - Participant leaves
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub queue_id: String,
    pub participant_id: String,
}

/// waitlist.remove.v1 - Owner marks a participant served or no-show
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveRequest {
    pub queue_id: String,
    pub participant_id: String,
    pub reason: RemovalReason,
}

/// Result of leave / remove
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// waitlist.snapshot.v1 / waitlist.subscribe.v1
///
/// Without `participant_id` the owner view (full list) is returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRequest {
    pub queue_id: String,
    #[serde(default)]
    pub participant_id: Option<String>,
}

/// waitlist.is_member.v1
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsMemberRequest {
    pub queue_id: String,
    pub participant_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsMemberResponse {
    pub queue_id: String,
    pub participant_id: String,
    pub in_queue: bool,
}

/// queue.list.v1 - Public queue list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListQueuesResponse {
    pub queues: Vec<QueueSummary>,
}

/// queue.register.v1 - Create a queue with an empty waitlist
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterQueueRequest {
    /// Generated when omitted
    #[serde(default)]
    pub queue_id: Option<String>,
    pub capacity: u32,
    pub estimated_service_minutes: u32,
    #[serde(default)]
    pub status: Option<QueueStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterQueueResponse {
    pub queue_id: String,
    pub status: QueueStatus,
}

/// queue.set_status.v1 - Open, pause or close a queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetStatusRequest {
    pub queue_id: String,
    pub status: QueueStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetStatusResponse {
    pub queue_id: String,
    pub status: QueueStatus,
}

/// waitlist.changed.v1 notification payload
///
/// The first notification of a subscription is the snapshot taken on
/// connect; every later one is a committed change carrying the full list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WaitlistNotification {
    Snapshot { snapshot: Snapshot },
    Changed { event: WaitlistChanged },
}

/// `data` member of every error object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcErrorData {
    pub kind: String,
    pub retryable: bool,
}
