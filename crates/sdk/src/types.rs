//! SDK Request/Response Types
//!
//! Mirrors the JSON-RPC types from the api-rpc crate.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    Open,
    Paused,
    Closed,
}

/// Why the owner took someone off the list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RemovalReason {
    Served,
    NoShow,
}

/// Where a participant stands (1-based position)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Standing {
    pub position: usize,
    pub people_ahead: usize,
    pub estimated_wait_minutes: u64,
    /// Epoch milliseconds
    pub estimated_ready_at: i64,
}

/// Response from join
#[derive(Debug, Clone, Deserialize)]
pub struct JoinReceipt {
    pub queue_id: String,
    pub participant_id: String,
    pub version: u64,
    #[serde(flatten)]
    pub standing: Standing,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueSettings {
    pub id: String,
    pub capacity: u32,
    pub estimated_service_minutes: u32,
    pub status: QueueStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PositionedEntry {
    pub position: usize,
    pub participant_id: String,
    pub joined_at: i64,
    pub estimated_wait_minutes: u64,
}

/// Full ordered waitlist, for the queue owner
#[derive(Debug, Clone, Deserialize)]
pub struct OwnerSnapshot {
    pub queue: QueueSettings,
    pub version: u64,
    pub entries: Vec<PositionedEntry>,
}

/// One participant's standing
///
/// When `in_queue` is false the standing is what the participant would get
/// by joining now.
#[derive(Debug, Clone, Deserialize)]
pub struct ParticipantSnapshot {
    pub queue_id: String,
    pub participant_id: String,
    pub status: QueueStatus,
    pub version: u64,
    pub in_queue: bool,
    #[serde(flatten)]
    pub standing: Standing,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub(crate) enum Snapshot {
    Owner(OwnerSnapshot),
    Participant(ParticipantSnapshot),
}

/// Public queue list row
#[derive(Debug, Clone, Deserialize)]
pub struct QueueSummary {
    pub queue_id: String,
    pub status: QueueStatus,
    pub capacity: u32,
    pub people_in_line: usize,
    pub estimated_wait_minutes: u64,
    pub version: u64,
}

/// Request to register a queue
#[derive(Debug, Clone, Serialize)]
pub struct RegisterQueueRequest {
    /// Generated by the daemon when `None`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_id: Option<String>,
    pub capacity: u32,
    pub estimated_service_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<QueueStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterQueueResponse {
    pub queue_id: String,
    pub status: QueueStatus,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct MembershipRequest<'a> {
    pub queue_id: &'a str,
    pub participant_id: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct RemoveRequest<'a> {
    pub queue_id: &'a str,
    pub participant_id: &'a str,
    pub reason: RemovalReason,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct SnapshotRequest<'a> {
    pub queue_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant_id: Option<&'a str>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct SetStatusRequest<'a> {
    pub queue_id: &'a str,
    pub status: QueueStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SuccessResponse {
    #[allow(dead_code)]
    pub success: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct IsMemberResponse {
    pub in_queue: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ListQueuesResponse {
    pub queues: Vec<QueueSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SetStatusResponse {
    pub status: QueueStatus,
}
