// Read models handed out by the waitlist engine

use crate::application::position::{PositionCalculator, Standing};
use crate::domain::{QueueSettings, QueueStatus, Version, VersionedWaitlist};
use serde::{Deserialize, Serialize};

/// Returned by a successful join
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinReceipt {
    pub queue_id: String,
    pub participant_id: String,
    /// Version committed by this join
    pub version: Version,
    #[serde(flatten)]
    pub standing: Standing,
}

/// One line of the owner dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionedEntry {
    pub position: usize,
    pub participant_id: String,
    pub joined_at: i64,
    pub estimated_wait_minutes: u64,
}

/// Full ordered list, as seen by the queue owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerView {
    pub queue: QueueSettings,
    pub version: Version,
    pub entries: Vec<PositionedEntry>,
}

impl OwnerView {
    pub(crate) fn build(queue: QueueSettings, snapshot: &VersionedWaitlist, now_millis: i64) -> Self {
        let calculator = PositionCalculator::new(queue.estimated_service_minutes);
        let entries = snapshot
            .waitlist
            .entries()
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let standing = calculator.standing_at(index, now_millis);
                PositionedEntry {
                    position: standing.position,
                    participant_id: entry.participant_id.clone(),
                    joined_at: entry.joined_at,
                    estimated_wait_minutes: standing.estimated_wait_minutes,
                }
            })
            .collect();

        Self {
            queue,
            version: snapshot.version,
            entries,
        }
    }

    /// Participant ids in line order
    pub fn participant_ids(&self) -> Vec<&str> {
        self.entries
            .iter()
            .map(|e| e.participant_id.as_str())
            .collect()
    }
}

/// One participant's standing
///
/// For someone not in line, `standing` is what they would get by joining now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantView {
    pub queue_id: String,
    pub participant_id: String,
    pub status: QueueStatus,
    pub version: Version,
    pub in_queue: bool,
    #[serde(flatten)]
    pub standing: Standing,
}

impl ParticipantView {
    pub(crate) fn build(
        queue: &QueueSettings,
        snapshot: &VersionedWaitlist,
        participant_id: &str,
        now_millis: i64,
    ) -> Self {
        let calculator = PositionCalculator::new(queue.estimated_service_minutes);
        let (in_queue, standing) = match calculator.standing_of(&snapshot.waitlist, participant_id, now_millis) {
            Some(standing) => (true, standing),
            None => (false, calculator.prospective(&snapshot.waitlist, now_millis)),
        };

        Self {
            queue_id: queue.id.clone(),
            participant_id: participant_id.to_string(),
            status: queue.status,
            version: snapshot.version,
            in_queue,
            standing,
        }
    }
}

/// Result of `snapshot`: owner view without a participant, participant view with one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum Snapshot {
    Owner(OwnerView),
    Participant(ParticipantView),
}

impl Snapshot {
    pub fn version(&self) -> Version {
        match self {
            Snapshot::Owner(v) => v.version,
            Snapshot::Participant(v) => v.version,
        }
    }
}

/// Public queue list row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSummary {
    pub queue_id: String,
    pub status: QueueStatus,
    pub capacity: u32,
    pub people_in_line: usize,
    /// Wait for someone joining now
    pub estimated_wait_minutes: u64,
    pub version: Version,
}

impl QueueSummary {
    pub(crate) fn build(queue: &QueueSettings, snapshot: &VersionedWaitlist) -> Self {
        let calculator = PositionCalculator::new(queue.estimated_service_minutes);
        let people_in_line = snapshot.waitlist.len();

        Self {
            queue_id: queue.id.clone(),
            status: queue.status,
            capacity: queue.capacity,
            people_in_line,
            estimated_wait_minutes: calculator.wait_minutes(people_in_line),
            version: snapshot.version,
        }
    }
}
