// WaitlistEntry Domain Model

use super::queue::QueueId;
use serde::{Deserialize, Serialize};

/// Participant identifier (issued by the identity collaborator)
pub type ParticipantId = String;

/// One participant's membership in one queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistEntry {
    pub participant_id: ParticipantId,
    pub queue_id: QueueId,
    /// Epoch ms, assigned by the engine at join time
    pub joined_at: i64,
}

impl WaitlistEntry {
    /// Create a new entry
    ///
    /// # Arguments
    ///
    /// * `queue_id` - Queue the participant joins (back-reference)
    /// * `participant_id` - Joining participant
    /// * `joined_at` - Join timestamp in epoch ms (injected, not system time)
    pub fn new(
        queue_id: impl Into<String>,
        participant_id: impl Into<String>,
        joined_at: i64,
    ) -> Self {
        Self {
            participant_id: participant_id.into(),
            queue_id: queue_id.into(),
            joined_at,
        }
    }

    pub fn belongs_to(&self, participant_id: &str) -> bool {
        self.participant_id == participant_id
    }
}
