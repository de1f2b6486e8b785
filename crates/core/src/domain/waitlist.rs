// Waitlist Domain Model - ordered FIFO sequence of entries for one queue

use super::entry::WaitlistEntry;
use super::error::{DomainError, Result};
use super::queue::QueueId;
use serde::{Deserialize, Serialize};

/// Monotonic per-queue counter used for optimistic concurrency
pub type Version = u64;

/// Ordered list of participants currently queued (insertion order = join order)
///
/// Values are immutable snapshots: mutations return a new `Waitlist` which the
/// caller writes back through `WaitlistStore::compare_and_swap`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Waitlist {
    queue_id: QueueId,
    entries: Vec<WaitlistEntry>,
}

impl Waitlist {
    pub fn empty(queue_id: impl Into<String>) -> Self {
        Self {
            queue_id: queue_id.into(),
            entries: Vec::new(),
        }
    }

    /// Rebuild a waitlist from stored entries (order preserved)
    pub fn from_entries(queue_id: impl Into<String>, entries: Vec<WaitlistEntry>) -> Self {
        Self {
            queue_id: queue_id.into(),
            entries,
        }
    }

    pub fn queue_id(&self) -> &str {
        &self.queue_id
    }

    pub fn entries(&self) -> &[WaitlistEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<WaitlistEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, participant_id: &str) -> bool {
        self.index_of(participant_id).is_some()
    }

    /// Zero-based index of the participant, if queued
    pub fn index_of(&self, participant_id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.belongs_to(participant_id))
    }

    /// Append an entry at the tail, enforcing uniqueness and capacity
    pub fn try_append(&self, entry: WaitlistEntry, capacity: u32) -> Result<Waitlist> {
        if self.contains(&entry.participant_id) {
            return Err(DomainError::AlreadyJoined {
                participant_id: entry.participant_id,
            });
        }
        if self.len() >= capacity as usize {
            return Err(DomainError::QueueFull { capacity });
        }

        let mut entries = self.entries.clone();
        entries.push(entry);
        Ok(Self {
            queue_id: self.queue_id.clone(),
            entries,
        })
    }

    /// Remove the participant's entry by identity, keeping the others in order
    pub fn without(&self, participant_id: &str) -> Result<Waitlist> {
        if !self.contains(participant_id) {
            return Err(DomainError::NotInQueue {
                participant_id: participant_id.to_string(),
            });
        }

        let entries = self
            .entries
            .iter()
            .filter(|e| !e.belongs_to(participant_id))
            .cloned()
            .collect();
        Ok(Self {
            queue_id: self.queue_id.clone(),
            entries,
        })
    }
}

/// A waitlist together with the version it was read at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedWaitlist {
    pub waitlist: Waitlist,
    pub version: Version,
}

impl VersionedWaitlist {
    pub fn new(waitlist: Waitlist, version: Version) -> Self {
        Self { waitlist, version }
    }
}
