// SQLite Queue Repository Implementation
//
// One `queues` row holds the queue metadata and its waitlist. The waitlist
// and its version are written by a single conditional UPDATE, so a stale
// writer matches zero rows instead of overwriting a newer list.

use crate::error::{is_unique_violation, map_sqlx_error};
use async_trait::async_trait;
use queueline_core::domain::{
    DomainError, QueueSettings, QueueStatus, Version, VersionedWaitlist, Waitlist, WaitlistEntry,
};
use queueline_core::error::{AppError, Result};
use queueline_core::port::{
    QueueDirectory, QueueRegistry, TimeProvider, WaitlistStore, WriteGuard,
};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

pub struct SqliteQueueRepository {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteQueueRepository {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }

    async fn current_state(&self, queue_id: &str) -> Result<Option<(i64, String)>> {
        sqlx::query_as("SELECT version, status FROM queues WHERE id = ?")
            .bind(queue_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }
}

#[async_trait]
impl WaitlistStore for SqliteQueueRepository {
    async fn read(&self, queue_id: &str) -> Result<VersionedWaitlist> {
        let row = sqlx::query_as::<_, WaitlistRow>(
            "SELECT id, entries, version FROM queues WHERE id = ?",
        )
        .bind(queue_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        match row {
            Some(row) => row.into_versioned(),
            None => Err(DomainError::QueueNotFound(queue_id.to_string()).into()),
        }
    }

    async fn compare_and_swap(
        &self,
        queue_id: &str,
        expected_version: Version,
        waitlist: Waitlist,
        guard: WriteGuard,
    ) -> Result<VersionedWaitlist> {
        let entries = serde_json::to_string(waitlist.entries())?;
        let expected = to_db_version(expected_version)?;
        let require_open = guard == WriteGuard::VersionAndOpen;

        let result = sqlx::query(
            r#"
            UPDATE queues
            SET entries = ?, version = version + 1
            WHERE id = ? AND version = ? AND (? = 0 OR status = 'open')
            "#,
        )
        .bind(&entries)
        .bind(queue_id)
        .bind(expected)
        .bind(require_open)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            // The queue is gone, another writer committed first, or it stopped accepting joins
            return match self.current_state(queue_id).await? {
                None => Err(DomainError::QueueNotFound(queue_id.to_string()).into()),
                Some((actual, status)) if require_open && actual == expected => {
                    Err(DomainError::QueueClosed { status }.into())
                }
                Some((actual, _)) => {
                    debug!(
                        queue_id = %queue_id,
                        expected_version = expected_version,
                        actual_version = actual,
                        "Conditional waitlist update matched no row"
                    );
                    Err(DomainError::VersionConflict {
                        expected: expected_version,
                        actual: from_db_version(actual)?,
                    }
                    .into())
                }
            };
        }

        Ok(VersionedWaitlist::new(waitlist, expected_version + 1))
    }
}

#[async_trait]
impl QueueDirectory for SqliteQueueRepository {
    async fn get_queue(&self, queue_id: &str) -> Result<QueueSettings> {
        let row = sqlx::query_as::<_, QueueRow>(
            r#"
            SELECT id, capacity, estimated_service_minutes, status
            FROM queues
            WHERE id = ?
            "#,
        )
        .bind(queue_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        match row {
            Some(row) => row.into_settings(),
            None => Err(DomainError::QueueNotFound(queue_id.to_string()).into()),
        }
    }

    async fn list_queues(&self) -> Result<Vec<QueueSettings>> {
        let rows = sqlx::query_as::<_, QueueRow>(
            r#"
            SELECT id, capacity, estimated_service_minutes, status
            FROM queues
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(QueueRow::into_settings).collect()
    }
}

#[async_trait]
impl QueueRegistry for SqliteQueueRepository {
    async fn register(&self, settings: &QueueSettings) -> Result<()> {
        settings
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let result = sqlx::query(
            r#"
            INSERT INTO queues (
                id, capacity, estimated_service_minutes, status,
                entries, version, created_at
            ) VALUES (?, ?, ?, ?, '[]', 0, ?)
            "#,
        )
        .bind(&settings.id)
        .bind(i64::from(settings.capacity))
        .bind(i64::from(settings.estimated_service_minutes))
        .bind(settings.status.to_string())
        .bind(self.time_provider.now_millis())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                info!(
                    queue_id = %settings.id,
                    capacity = settings.capacity,
                    estimated_service_minutes = settings.estimated_service_minutes,
                    "Queue registered"
                );
                Ok(())
            }
            Err(e) if is_unique_violation(&e) => Err(AppError::Conflict(format!(
                "Queue {} already exists",
                settings.id
            ))),
            Err(e) => Err(map_sqlx_error(e)),
        }
    }

    async fn set_status(&self, queue_id: &str, status: QueueStatus) -> Result<()> {
        // Status lives beside the waitlist but never bumps its version
        let result = sqlx::query("UPDATE queues SET status = ? WHERE id = ?")
            .bind(status.to_string())
            .bind(queue_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::QueueNotFound(queue_id.to_string()).into());
        }

        info!(queue_id = %queue_id, status = %status, "Queue status changed");
        Ok(())
    }
}

fn to_db_version(version: Version) -> Result<i64> {
    i64::try_from(version)
        .map_err(|_| AppError::Internal(format!("Version {} exceeds SQLite range", version)))
}

fn from_db_version(version: i64) -> Result<Version> {
    Version::try_from(version)
        .map_err(|_| AppError::Database(format!("Negative waitlist version: {}", version)))
}

fn to_u32(column: &str, value: i64) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| AppError::Database(format!("Invalid {} value: {}", column, value)))
}

// Database row representations
#[derive(Debug, sqlx::FromRow)]
struct QueueRow {
    id: String,
    capacity: i64,
    estimated_service_minutes: i64,
    status: String,
}

impl QueueRow {
    fn into_settings(self) -> Result<QueueSettings> {
        let status = QueueStatus::from_str(&self.status)
            .map_err(|e| AppError::Database(format!("Queue {}: {}", self.id, e)))?;

        Ok(QueueSettings {
            capacity: to_u32("capacity", self.capacity)?,
            estimated_service_minutes: to_u32(
                "estimated_service_minutes",
                self.estimated_service_minutes,
            )?,
            status,
            id: self.id,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WaitlistRow {
    id: String,
    entries: String,
    version: i64,
}

impl WaitlistRow {
    fn into_versioned(self) -> Result<VersionedWaitlist> {
        let entries: Vec<WaitlistEntry> = serde_json::from_str(&self.entries)?;
        Ok(VersionedWaitlist::new(
            Waitlist::from_entries(self.id, entries),
            from_db_version(self.version)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations};
    use queueline_core::port::time_provider::FixedTimeProvider;

    async fn setup_repo() -> SqliteQueueRepository {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteQueueRepository::new(pool, Arc::new(FixedTimeProvider::new(1_000)))
    }

    fn with_entries(waitlist: &Waitlist, participants: &[&str]) -> Waitlist {
        let mut entries = waitlist.entries().to_vec();
        entries.extend(
            participants
                .iter()
                .map(|p| WaitlistEntry::new(waitlist.queue_id(), *p, 42)),
        );
        Waitlist::from_entries(waitlist.queue_id(), entries)
    }

    #[tokio::test]
    async fn test_register_creates_empty_waitlist_at_version_zero() {
        let repo = setup_repo().await;
        repo.register(&QueueSettings::new("q1", 3, 10).unwrap())
            .await
            .unwrap();

        let current = repo.read("q1").await.unwrap();
        assert!(current.waitlist.is_empty());
        assert_eq!(current.version, 0);

        let settings = repo.get_queue("q1").await.unwrap();
        assert_eq!(settings.capacity, 3);
        assert_eq!(settings.estimated_service_minutes, 10);
        assert_eq!(settings.status, QueueStatus::Open);
    }

    #[tokio::test]
    async fn test_duplicate_register_is_conflict() {
        let repo = setup_repo().await;
        let settings = QueueSettings::new("q1", 3, 10).unwrap();
        repo.register(&settings).await.unwrap();

        let err = repo.register(&settings).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_register_rejects_zero_capacity() {
        let repo = setup_repo().await;
        let settings = QueueSettings {
            id: "q1".to_string(),
            capacity: 0,
            estimated_service_minutes: 10,
            status: QueueStatus::Open,
        };

        let err = repo.register(&settings).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_cas_advances_version_and_keeps_order() {
        let repo = setup_repo().await;
        repo.register(&QueueSettings::new("q1", 5, 10).unwrap())
            .await
            .unwrap();

        let current = repo.read("q1").await.unwrap();
        let next = with_entries(&current.waitlist, &["p1", "p2", "p3"]);
        let committed = repo
            .compare_and_swap("q1", 0, next, WriteGuard::Version)
            .await
            .unwrap();
        assert_eq!(committed.version, 1);

        let reread = repo.read("q1").await.unwrap();
        assert_eq!(reread.version, 1);
        let ids: Vec<&str> = reread
            .waitlist
            .entries()
            .iter()
            .map(|e| e.participant_id.as_str())
            .collect();
        assert_eq!(ids, vec!["p1", "p2", "p3"]);
        assert_eq!(reread.waitlist.entries()[0].joined_at, 42);
    }

    #[tokio::test]
    async fn test_stale_cas_reports_conflict_and_changes_nothing() {
        let repo = setup_repo().await;
        repo.register(&QueueSettings::new("q1", 5, 10).unwrap())
            .await
            .unwrap();

        let base = repo.read("q1").await.unwrap();
        let winner = with_entries(&base.waitlist, &["winner"]);
        repo.compare_and_swap("q1", 0, winner, WriteGuard::Version)
            .await
            .unwrap();

        let loser = with_entries(&base.waitlist, &["loser"]);
        let err = repo
            .compare_and_swap("q1", 0, loser, WriteGuard::Version)
            .await
            .unwrap_err();
        assert!(err.is_version_conflict());
        assert_eq!(
            err.as_domain(),
            Some(&DomainError::VersionConflict {
                expected: 0,
                actual: 1
            })
        );

        let current = repo.read("q1").await.unwrap();
        assert_eq!(current.version, 1);
        assert!(current.waitlist.contains("winner"));
        assert!(!current.waitlist.contains("loser"));
    }

    #[tokio::test]
    async fn test_open_guard_rejects_write_to_paused_queue() {
        let repo = setup_repo().await;
        repo.register(&QueueSettings::new("q1", 5, 10).unwrap())
            .await
            .unwrap();
        let base = repo.read("q1").await.unwrap();
        repo.set_status("q1", QueueStatus::Paused).await.unwrap();

        let joiner = with_entries(&base.waitlist, &["p1"]);
        let err = repo
            .compare_and_swap("q1", 0, joiner, WriteGuard::VersionAndOpen)
            .await
            .unwrap_err();
        assert!(!err.is_version_conflict());
        assert_eq!(
            err.as_domain(),
            Some(&DomainError::QueueClosed {
                status: "paused".to_string()
            })
        );
        let current = repo.read("q1").await.unwrap();
        assert_eq!(current.version, 0);
        assert!(current.waitlist.is_empty());

        // Version-only writes still land while paused
        let leaver = with_entries(&base.waitlist, &["p2"]);
        let committed = repo
            .compare_and_swap("q1", 0, leaver, WriteGuard::Version)
            .await
            .unwrap();
        assert_eq!(committed.version, 1);
    }

    #[tokio::test]
    async fn test_unknown_queue_is_not_found() {
        let repo = setup_repo().await;

        let err = repo.read("ghost").await.unwrap_err();
        assert_eq!(
            err.as_domain(),
            Some(&DomainError::QueueNotFound("ghost".to_string()))
        );

        let err = repo
            .compare_and_swap("ghost", 0, Waitlist::empty("ghost"), WriteGuard::Version)
            .await
            .unwrap_err();
        assert!(!err.is_version_conflict());
        assert!(matches!(err.as_domain(), Some(DomainError::QueueNotFound(_))));

        assert!(repo.get_queue("ghost").await.is_err());
        assert!(repo.set_status("ghost", QueueStatus::Closed).await.is_err());
    }

    #[tokio::test]
    async fn test_set_status_leaves_version_alone() {
        let repo = setup_repo().await;
        repo.register(&QueueSettings::new("q1", 5, 10).unwrap())
            .await
            .unwrap();

        repo.set_status("q1", QueueStatus::Paused).await.unwrap();

        assert_eq!(
            repo.get_queue("q1").await.unwrap().status,
            QueueStatus::Paused
        );
        assert_eq!(repo.read("q1").await.unwrap().version, 0);
    }

    #[tokio::test]
    async fn test_list_queues_sorted_by_id() {
        let repo = setup_repo().await;
        for id in ["zeta", "alpha", "mid"] {
            repo.register(&QueueSettings::new(id, 5, 10).unwrap())
                .await
                .unwrap();
        }

        let ids: Vec<String> = repo
            .list_queues()
            .await
            .unwrap()
            .into_iter()
            .map(|q| q.id)
            .collect();
        assert_eq!(ids, vec!["alpha", "mid", "zeta"]);
    }
}
