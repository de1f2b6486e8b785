// Waitlist Store Port (Interface)

use crate::domain::{Version, VersionedWaitlist, Waitlist};
use crate::error::Result;
use async_trait::async_trait;

/// Queue state a conditional write must still observe at commit time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteGuard {
    /// Only the version must match
    Version,
    /// The version must match and the queue must still accept joins
    VersionAndOpen,
}

/// Authoritative per-queue waitlist storage with optimistic concurrency
///
/// All guarantees are per queue; there is no ordering across queues.
#[async_trait]
pub trait WaitlistStore: Send + Sync {
    /// Read the current waitlist and its version
    ///
    /// # Errors
    /// - `DomainError::QueueNotFound` if the queue has no waitlist
    async fn read(&self, queue_id: &str) -> Result<VersionedWaitlist>;

    /// Replace the waitlist if the stored version still equals `expected_version`
    ///
    /// On success the version advances by exactly one, atomically with the
    /// list, and the committed snapshot is returned.
    ///
    /// Status changes do not bump the version, so `WriteGuard::VersionAndOpen`
    /// checks the status in the same atomic step.
    ///
    /// # Errors
    /// - `DomainError::VersionConflict` if another writer got there first
    /// - `DomainError::QueueClosed` if guarded and the queue is no longer open
    /// - `DomainError::QueueNotFound` if the queue has no waitlist
    async fn compare_and_swap(
        &self,
        queue_id: &str,
        expected_version: Version,
        waitlist: Waitlist,
        guard: WriteGuard,
    ) -> Result<VersionedWaitlist>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::{DomainError, QueueSettings, QueueStatus, WaitlistEntry};
    use crate::error::AppError;
    use crate::port::{QueueDirectory, QueueRegistry};
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    struct QueueRecord {
        settings: QueueSettings,
        waitlist: Waitlist,
        version: Version,
    }

    /// In-memory queue metadata + waitlist storage
    #[derive(Default)]
    pub struct InMemoryQueueRepository {
        queues: Mutex<HashMap<String, QueueRecord>>,
    }

    impl InMemoryQueueRepository {
        pub fn new() -> Self {
            Self::default()
        }

        /// Seed a queue with existing entries (version starts at 0)
        pub fn seed(&self, settings: QueueSettings, participants: &[&str]) {
            let entries = participants
                .iter()
                .enumerate()
                .map(|(i, p)| WaitlistEntry::new(settings.id.clone(), *p, i as i64))
                .collect();
            let waitlist = Waitlist::from_entries(settings.id.clone(), entries);
            self.queues.lock().unwrap().insert(
                settings.id.clone(),
                QueueRecord {
                    settings,
                    waitlist,
                    version: 0,
                },
            );
        }
    }

    #[async_trait]
    impl WaitlistStore for InMemoryQueueRepository {
        async fn read(&self, queue_id: &str) -> Result<VersionedWaitlist> {
            let queues = self.queues.lock().unwrap();
            let record = queues
                .get(queue_id)
                .ok_or_else(|| DomainError::QueueNotFound(queue_id.to_string()))?;
            Ok(VersionedWaitlist::new(
                record.waitlist.clone(),
                record.version,
            ))
        }

        async fn compare_and_swap(
            &self,
            queue_id: &str,
            expected_version: Version,
            waitlist: Waitlist,
            guard: WriteGuard,
        ) -> Result<VersionedWaitlist> {
            let mut queues = self.queues.lock().unwrap();
            let record = queues
                .get_mut(queue_id)
                .ok_or_else(|| DomainError::QueueNotFound(queue_id.to_string()))?;

            if record.version != expected_version {
                return Err(DomainError::VersionConflict {
                    expected: expected_version,
                    actual: record.version,
                }
                .into());
            }
            if guard == WriteGuard::VersionAndOpen && !record.settings.status.accepts_joins() {
                return Err(DomainError::QueueClosed {
                    status: record.settings.status.to_string(),
                }
                .into());
            }

            record.waitlist = waitlist;
            record.version += 1;
            Ok(VersionedWaitlist::new(
                record.waitlist.clone(),
                record.version,
            ))
        }
    }

    #[async_trait]
    impl QueueDirectory for InMemoryQueueRepository {
        async fn get_queue(&self, queue_id: &str) -> Result<QueueSettings> {
            let queues = self.queues.lock().unwrap();
            queues
                .get(queue_id)
                .map(|r| r.settings.clone())
                .ok_or_else(|| DomainError::QueueNotFound(queue_id.to_string()).into())
        }

        async fn list_queues(&self) -> Result<Vec<QueueSettings>> {
            let queues = self.queues.lock().unwrap();
            let mut all: Vec<QueueSettings> =
                queues.values().map(|r| r.settings.clone()).collect();
            all.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(all)
        }
    }

    #[async_trait]
    impl QueueRegistry for InMemoryQueueRepository {
        async fn register(&self, settings: &QueueSettings) -> Result<()> {
            settings
                .validate()
                .map_err(|e| AppError::Validation(e.to_string()))?;

            let mut queues = self.queues.lock().unwrap();
            if queues.contains_key(&settings.id) {
                return Err(AppError::Conflict(format!(
                    "Queue {} already exists",
                    settings.id
                )));
            }
            queues.insert(
                settings.id.clone(),
                QueueRecord {
                    settings: settings.clone(),
                    waitlist: Waitlist::empty(settings.id.clone()),
                    version: 0,
                },
            );
            Ok(())
        }

        async fn set_status(&self, queue_id: &str, status: QueueStatus) -> Result<()> {
            let mut queues = self.queues.lock().unwrap();
            let record = queues
                .get_mut(queue_id)
                .ok_or_else(|| DomainError::QueueNotFound(queue_id.to_string()))?;
            record.settings.status = status;
            Ok(())
        }
    }

    /// A competing writer's mutation, applied just before a CAS goes through
    #[derive(Debug, Clone)]
    pub enum Interference {
        Join(String),
        Leave(String),
        /// Rewrite the same list (version bump only)
        Touch,
        /// Change the queue status (version unchanged)
        SetStatus(QueueStatus),
    }

    /// Store wrapper that loses CAS races on purpose
    ///
    /// Before forwarding a `compare_and_swap`, it commits the next scheduled
    /// interference to the inner store, so the caller's expected version is
    /// stale by exactly one.
    pub struct ContendedStore {
        inner: Arc<InMemoryQueueRepository>,
        scheduled: Mutex<VecDeque<Interference>>,
        perpetual: bool,
        cas_calls: AtomicUsize,
    }

    impl ContendedStore {
        pub fn new(inner: Arc<InMemoryQueueRepository>, scheduled: Vec<Interference>) -> Self {
            Self {
                inner,
                scheduled: Mutex::new(scheduled.into()),
                perpetual: false,
                cas_calls: AtomicUsize::new(0),
            }
        }

        /// Every CAS attempt loses
        pub fn always_conflicting(inner: Arc<InMemoryQueueRepository>) -> Self {
            Self {
                perpetual: true,
                ..Self::new(inner, Vec::new())
            }
        }

        pub fn cas_calls(&self) -> usize {
            self.cas_calls.load(Ordering::SeqCst)
        }

        async fn interfere(&self, queue_id: &str) -> Result<()> {
            let next = self.scheduled.lock().unwrap().pop_front();
            let interference = match next {
                Some(i) => i,
                None if self.perpetual => Interference::Touch,
                None => return Ok(()),
            };

            if let Interference::SetStatus(status) = interference {
                return self.inner.set_status(queue_id, status).await;
            }

            let current = self.inner.read(queue_id).await?;
            let rewritten = match interference {
                Interference::Join(p) => {
                    let mut entries = current.waitlist.clone().into_entries();
                    entries.push(WaitlistEntry::new(queue_id, p, 0));
                    Waitlist::from_entries(queue_id, entries)
                }
                Interference::Leave(p) => current.waitlist.without(&p)?,
                Interference::Touch | Interference::SetStatus(_) => current.waitlist.clone(),
            };
            self.inner
                .compare_and_swap(queue_id, current.version, rewritten, WriteGuard::Version)
                .await?;
            Ok(())
        }
    }

    #[async_trait]
    impl WaitlistStore for ContendedStore {
        async fn read(&self, queue_id: &str) -> Result<VersionedWaitlist> {
            self.inner.read(queue_id).await
        }

        async fn compare_and_swap(
            &self,
            queue_id: &str,
            expected_version: Version,
            waitlist: Waitlist,
            guard: WriteGuard,
        ) -> Result<VersionedWaitlist> {
            self.cas_calls.fetch_add(1, Ordering::SeqCst);
            self.interfere(queue_id).await?;
            self.inner
                .compare_and_swap(queue_id, expected_version, waitlist, guard)
                .await
        }
    }
}
