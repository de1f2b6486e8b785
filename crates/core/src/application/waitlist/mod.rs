// Queue Waitlist Engine - join / leave / owner removal / snapshots
//
// Every mutation is a read-modify-CAS-retry loop against `WaitlistStore`;
// reads never take part in the loop. Positions are recomputed on each read.

pub mod constants;
mod mutation;
pub mod view;


pub use view::{JoinReceipt, OwnerView, ParticipantView, PositionedEntry, QueueSummary, Snapshot};

use crate::application::position::PositionCalculator;
use crate::application::retry::CasRetryPolicy;
use crate::domain::{ChangeKind, DomainError, RemovalReason, WaitlistEntry};
use crate::error::{AppError, Result};
use crate::port::{
    ChangeNotifier, QueueDirectory, TimeProvider, WaitlistStore, WaitlistSubscription, WriteGuard,
};
use constants::{DEFAULT_CAS_BACKOFF_MS, DEFAULT_MAX_CAS_ATTEMPTS};
use mutation::Mutation;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Engine tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// CAS attempts per request before giving up with `ConcurrencyExhausted`
    pub max_cas_attempts: u32,
    /// Base backoff between attempts (0 = yield only)
    pub retry_base_delay_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_cas_attempts: DEFAULT_MAX_CAS_ATTEMPTS,
            retry_base_delay_ms: DEFAULT_CAS_BACKOFF_MS,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_cas_attempts == 0 {
            return Err(AppError::Config(
                "max_cas_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Waitlist engine (cheap to clone; all state lives behind the ports)
#[derive(Clone)]
pub struct QueueWaitlistEngine {
    store: Arc<dyn WaitlistStore>,
    directory: Arc<dyn QueueDirectory>,
    notifier: Arc<dyn ChangeNotifier>,
    time_provider: Arc<dyn TimeProvider>,
    retry_policy: CasRetryPolicy,
}

impl QueueWaitlistEngine {
    pub fn new(
        store: Arc<dyn WaitlistStore>,
        directory: Arc<dyn QueueDirectory>,
        notifier: Arc<dyn ChangeNotifier>,
        time_provider: Arc<dyn TimeProvider>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            directory,
            notifier,
            time_provider,
            retry_policy: CasRetryPolicy::new(
                config.max_cas_attempts,
                config.retry_base_delay_ms,
            ),
        }
    }

    /// Append the participant to the tail of the queue
    ///
    /// # Errors
    /// - `QueueClosed` unless the queue is open
    /// - `AlreadyJoined` if the participant is already waiting
    /// - `QueueFull` if the waitlist is at capacity
    /// - `ConcurrencyExhausted` if every CAS attempt lost a race
    pub async fn join(&self, queue_id: &str, participant_id: &str) -> Result<JoinReceipt> {
        validate_ids(queue_id, participant_id)?;

        let mutation = Mutation {
            kind: ChangeKind::Joined,
            participant_id,
            reason: None,
            // A pause between validation and commit must still reject the join
            guard: WriteGuard::VersionAndOpen,
        };
        let (queue, committed) = self
            .commit(queue_id, mutation, |queue, waitlist, now| {
                if !queue.status.accepts_joins() {
                    return Err(DomainError::QueueClosed {
                        status: queue.status.to_string(),
                    });
                }
                waitlist.try_append(
                    WaitlistEntry::new(queue_id, participant_id, now),
                    queue.capacity,
                )
            })
            .await?;

        let standing = PositionCalculator::new(queue.estimated_service_minutes)
            .standing_of(
                &committed.waitlist,
                participant_id,
                self.time_provider.now_millis(),
            )
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "Participant {} missing from committed waitlist of {}",
                    participant_id, queue_id
                ))
            })?;

        Ok(JoinReceipt {
            queue_id: queue_id.to_string(),
            participant_id: participant_id.to_string(),
            version: committed.version,
            standing,
        })
    }

    /// Participant leaves the queue
    ///
    /// # Errors
    /// - `NotInQueue` if absent (including a second leave)
    pub async fn leave(&self, queue_id: &str, participant_id: &str) -> Result<()> {
        validate_ids(queue_id, participant_id)?;

        let mutation = Mutation {
            kind: ChangeKind::Left,
            participant_id,
            reason: None,
            guard: WriteGuard::Version,
        };
        self.commit(queue_id, mutation, |_, waitlist, _| {
            waitlist.without(participant_id)
        })
        .await?;
        Ok(())
    }

    /// Owner removes a participant (served or no-show)
    ///
    /// Same mechanics as `leave`; the reason only travels on the event.
    pub async fn remove_by_owner(
        &self,
        queue_id: &str,
        participant_id: &str,
        reason: RemovalReason,
    ) -> Result<()> {
        validate_ids(queue_id, participant_id)?;

        let mutation = Mutation {
            kind: ChangeKind::Removed,
            participant_id,
            reason: Some(reason),
            guard: WriteGuard::Version,
        };
        self.commit(queue_id, mutation, |_, waitlist, _| {
            waitlist.without(participant_id)
        })
        .await?;
        Ok(())
    }

    /// Owner view without a participant, participant view with one
    pub async fn snapshot(&self, queue_id: &str, participant_id: Option<&str>) -> Result<Snapshot> {
        match participant_id {
            Some(participant_id) => self
                .participant_snapshot(queue_id, participant_id)
                .await
                .map(Snapshot::Participant),
            None => self.owner_snapshot(queue_id).await.map(Snapshot::Owner),
        }
    }

    /// Full ordered list with positions
    pub async fn owner_snapshot(&self, queue_id: &str) -> Result<OwnerView> {
        let queue = self.directory.get_queue(queue_id).await?;
        let current = self.store.read(queue_id).await?;
        Ok(OwnerView::build(
            queue,
            &current,
            self.time_provider.now_millis(),
        ))
    }

    /// Standing of one participant (prospective if not in line)
    pub async fn participant_snapshot(
        &self,
        queue_id: &str,
        participant_id: &str,
    ) -> Result<ParticipantView> {
        validate_ids(queue_id, participant_id)?;

        let queue = self.directory.get_queue(queue_id).await?;
        let current = self.store.read(queue_id).await?;
        Ok(ParticipantView::build(
            &queue,
            &current,
            participant_id,
            self.time_provider.now_millis(),
        ))
    }

    pub async fn is_member(&self, queue_id: &str, participant_id: &str) -> Result<bool> {
        let current = self.store.read(queue_id).await?;
        Ok(current.waitlist.contains(participant_id))
    }

    /// Public queue list with people in line and newcomer wait
    pub async fn list_queues(&self) -> Result<Vec<QueueSummary>> {
        let queues = self.directory.list_queues().await?;
        let mut summaries = Vec::with_capacity(queues.len());

        for queue in &queues {
            let current = self.store.read(&queue.id).await?;
            summaries.push(QueueSummary::build(queue, &current));
        }

        debug!(count = summaries.len(), "Listed queues");
        Ok(summaries)
    }

    /// Live changes of one queue
    ///
    /// Subscribe first, then take a snapshot and `resync_from` its version;
    /// events published in between are then deduplicated.
    pub fn subscribe(&self, queue_id: &str) -> WaitlistSubscription {
        WaitlistSubscription::new(self.notifier.subscribe(queue_id))
    }
}

fn validate_ids(queue_id: &str, participant_id: &str) -> std::result::Result<(), DomainError> {
    if queue_id.trim().is_empty() {
        return Err(DomainError::ValidationError(
            "queue_id cannot be empty".to_string(),
        ));
    }
    if participant_id.trim().is_empty() {
        return Err(DomainError::ValidationError(
            "participant_id cannot be empty".to_string(),
        ));
    }
    Ok(())
}
