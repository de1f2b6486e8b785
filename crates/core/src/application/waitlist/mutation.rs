// Read-modify-CAS-retry loop shared by join, leave and owner removal

use super::QueueWaitlistEngine;
use crate::application::retry::RetryDecision;
use crate::domain::{
    ChangeKind, DomainError, QueueSettings, RemovalReason, Version, VersionedWaitlist,
    Waitlist, WaitlistChanged,
};
use crate::error::{AppError, Result};
use crate::port::WriteGuard;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// What is being changed, for logging and the emitted event
pub(super) struct Mutation<'a> {
    pub kind: ChangeKind,
    pub participant_id: &'a str,
    pub reason: Option<RemovalReason>,
    pub guard: WriteGuard,
}

impl QueueWaitlistEngine {
    /// Apply `apply` to the latest snapshot and commit it via compare-and-swap
    ///
    /// Queue metadata and the waitlist are re-read on every attempt, so each
    /// precondition is checked against the state the write will replace.
    /// A lost race is retried up to the policy's attempt budget.
    pub(super) async fn commit<F>(
        &self,
        queue_id: &str,
        mutation: Mutation<'_>,
        apply: F,
    ) -> Result<(QueueSettings, VersionedWaitlist)>
    where
        F: Fn(&QueueSettings, &Waitlist, i64) -> std::result::Result<Waitlist, DomainError>
            + Send
            + Sync,
    {
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;

            let queue = self.directory.get_queue(queue_id).await?;
            let current = self.store.read(queue_id).await?;
            let next = apply(&queue, &current.waitlist, self.time_provider.now_millis())?;

            match self
                .write_and_publish(queue_id, current.version, next, &mutation)
                .await
            {
                Ok(committed) => {
                    info!(
                        queue_id = %queue_id,
                        participant_id = %mutation.participant_id,
                        kind = ?mutation.kind,
                        version = committed.version,
                        attempts = attempts,
                        "Waitlist updated"
                    );
                    return Ok((queue, committed));
                }
                Err(e) if e.is_version_conflict() => {
                    debug!(
                        queue_id = %queue_id,
                        participant_id = %mutation.participant_id,
                        expected_version = current.version,
                        attempt = attempts,
                        "Lost CAS race, re-reading waitlist"
                    );

                    match self
                        .retry_policy
                        .after_conflict(attempts, mutation.participant_id)
                    {
                        RetryDecision::Retry(0) => tokio::task::yield_now().await,
                        RetryDecision::Retry(delay_ms) => {
                            tokio::time::sleep(Duration::from_millis(delay_ms)).await
                        }
                        RetryDecision::Exhausted => {
                            warn!(
                                queue_id = %queue_id,
                                participant_id = %mutation.participant_id,
                                attempts = attempts,
                                "Giving up after repeated CAS conflicts"
                            );
                            return Err(DomainError::ConcurrencyExhausted { attempts }.into());
                        }
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// CAS plus publish on a detached task
    ///
    /// Once the write is issued, dropping the caller's future (client gone,
    /// request timeout) no longer stops the commit or its event.
    async fn write_and_publish(
        &self,
        queue_id: &str,
        expected_version: Version,
        next: Waitlist,
        mutation: &Mutation<'_>,
    ) -> Result<VersionedWaitlist> {
        let store = Arc::clone(&self.store);
        let notifier = Arc::clone(&self.notifier);
        let queue_id = queue_id.to_string();
        let participant_id = mutation.participant_id.to_string();
        let (kind, reason, guard) = (mutation.kind, mutation.reason, mutation.guard);

        let task = tokio::spawn(async move {
            let committed = store
                .compare_and_swap(&queue_id, expected_version, next, guard)
                .await?;

            let event = WaitlistChanged::new(kind, participant_id, reason, &committed);
            notifier.publish(&queue_id, Arc::new(event)).await;
            Ok::<_, AppError>(committed)
        });

        task.await
            .map_err(|e| AppError::Internal(format!("Waitlist write task failed: {}", e)))?
    }
}
