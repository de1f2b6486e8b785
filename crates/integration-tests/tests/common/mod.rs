//! Shared fixtures: a throwaway SQLite file and an engine wired on top of it

#![allow(dead_code)]

use queueline_core::application::{EngineConfig, QueueWaitlistEngine};
use queueline_core::domain::{QueueSettings, QueueStatus};
use queueline_core::port::time_provider::FixedTimeProvider;
use queueline_core::port::{BroadcastChangeNotifier, QueueRegistry, TimeProvider};
use queueline_infra_sqlite::{create_pool, run_migrations, SqliteQueueRepository};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;

pub const NOW: i64 = 1_700_000_000_000;

/// SQLite database file under the temp dir, removed on drop
pub struct TestDb {
    pub path: PathBuf,
}

impl TestDb {
    pub fn new() -> Self {
        let path = std::env::temp_dir().join(format!("queueline_it_{}.db", uuid::Uuid::new_v4()));
        Self { path }
    }

    pub fn url(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    pub async fn open(&self) -> SqlitePool {
        let pool = create_pool(&self.url()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }
}

impl Drop for TestDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut path = self.path.clone().into_os_string();
            path.push(suffix);
            let _ = std::fs::remove_file(path);
        }
    }
}

pub struct Stack {
    pub engine: QueueWaitlistEngine,
    pub repo: Arc<SqliteQueueRepository>,
    pub notifier: Arc<BroadcastChangeNotifier>,
    pub pool: SqlitePool,
}

pub fn stack_on(pool: SqlitePool, config: EngineConfig) -> Stack {
    let time_provider: Arc<dyn TimeProvider> = Arc::new(FixedTimeProvider::new(NOW));
    let repo = Arc::new(SqliteQueueRepository::new(pool.clone(), time_provider.clone()));
    let notifier = Arc::new(BroadcastChangeNotifier::default());
    let engine = QueueWaitlistEngine::new(
        repo.clone(),
        repo.clone(),
        notifier.clone(),
        time_provider,
        config,
    );

    Stack {
        engine,
        repo,
        notifier,
        pool,
    }
}

pub async fn register(stack: &Stack, id: &str, capacity: u32, service_minutes: u32) {
    let settings = QueueSettings::new(id, capacity, service_minutes).unwrap();
    stack.repo.register(&settings).await.unwrap();
}

pub async fn register_with_status(
    stack: &Stack,
    id: &str,
    capacity: u32,
    service_minutes: u32,
    status: QueueStatus,
) {
    let settings = QueueSettings::new(id, capacity, service_minutes)
        .unwrap()
        .with_status(status);
    stack.repo.register(&settings).await.unwrap();
}

pub async fn line_of(stack: &Stack, queue_id: &str) -> Vec<String> {
    stack
        .engine
        .owner_snapshot(queue_id)
        .await
        .unwrap()
        .participant_ids()
        .into_iter()
        .map(str::to_string)
        .collect()
}
