// Waitlist Change Events

use super::entry::{ParticipantId, WaitlistEntry};
use super::queue::QueueId;
use super::waitlist::{Version, VersionedWaitlist};
use serde::{Deserialize, Serialize};

/// Kind of mutation that produced a change event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Joined,
    Left,
    Removed,
}

/// Why an owner removed a participant
///
/// Opaque to the engine; carried on the event for downstream analytics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RemovalReason {
    Served,
    NoShow,
}

impl std::fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemovalReason::Served => write!(f, "served"),
            RemovalReason::NoShow => write!(f, "noShow"),
        }
    }
}

/// Published after every committed waitlist mutation
///
/// Carries the full new ordered list so subscribers replace their state
/// instead of merging partial updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistChanged {
    pub queue_id: QueueId,
    pub kind: ChangeKind,
    pub participant_id: ParticipantId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<RemovalReason>,
    pub version: Version,
    pub entries: Vec<WaitlistEntry>,
}

impl WaitlistChanged {
    pub fn new(
        kind: ChangeKind,
        participant_id: impl Into<String>,
        reason: Option<RemovalReason>,
        committed: &VersionedWaitlist,
    ) -> Self {
        Self {
            queue_id: committed.waitlist.queue_id().to_string(),
            kind,
            participant_id: participant_id.into(),
            reason,
            version: committed.version,
            entries: committed.waitlist.entries().to_vec(),
        }
    }
}
