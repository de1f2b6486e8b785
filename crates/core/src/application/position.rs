// Position Calculator - derives standing from an immutable waitlist snapshot
//
// Nothing here is cached: `now` and the queue length change between reads,
// so every read recomputes from the snapshot it was handed.

use crate::domain::Waitlist;
use serde::{Deserialize, Serialize};

const MILLIS_PER_MINUTE: i64 = 60_000;

/// A participant's place in line and the derived wait estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    /// 1-based rank
    pub position: usize,
    pub people_ahead: usize,
    pub estimated_wait_minutes: u64,
    /// Epoch ms
    pub estimated_ready_at: i64,
}

/// Pure position/wait-time arithmetic for one queue
#[derive(Debug, Clone, Copy)]
pub struct PositionCalculator {
    estimated_service_minutes: u32,
}

impl PositionCalculator {
    pub fn new(estimated_service_minutes: u32) -> Self {
        Self {
            estimated_service_minutes,
        }
    }

    /// Wait for someone with `people_ahead` participants in front of them
    pub fn wait_minutes(&self, people_ahead: usize) -> u64 {
        people_ahead as u64 * u64::from(self.estimated_service_minutes)
    }

    /// Standing of the participant at zero-based `index`
    pub fn standing_at(&self, index: usize, now_millis: i64) -> Standing {
        let estimated_wait_minutes = self.wait_minutes(index);
        let wait_millis = i64::try_from(estimated_wait_minutes)
            .unwrap_or(i64::MAX)
            .saturating_mul(MILLIS_PER_MINUTE);

        Standing {
            position: index + 1,
            people_ahead: index,
            estimated_wait_minutes,
            estimated_ready_at: now_millis.saturating_add(wait_millis),
        }
    }

    /// Standing of a queued participant, or `None` if they are not in the list
    pub fn standing_of(
        &self,
        waitlist: &Waitlist,
        participant_id: &str,
        now_millis: i64,
    ) -> Option<Standing> {
        waitlist
            .index_of(participant_id)
            .map(|index| self.standing_at(index, now_millis))
    }

    /// Standing a newcomer would get: served after everyone currently in line
    pub fn prospective(&self, waitlist: &Waitlist, now_millis: i64) -> Standing {
        self.standing_at(waitlist.len(), now_millis)
    }
}
