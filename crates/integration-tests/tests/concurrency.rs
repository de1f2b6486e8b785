//! Concurrent mutations against one SQLite-backed queue
//!
//! Runs on a multi-thread runtime with a file database so that writers
//! really race on the versioned row.

mod common;

use common::{line_of, register, stack_on, TestDb};
use queueline_core::application::EngineConfig;
use queueline_core::domain::DomainError;
use queueline_core::AppError;
use std::collections::HashSet;

fn contended_config(participants: usize) -> EngineConfig {
    EngineConfig {
        // Worst case every other writer wins first
        max_cas_attempts: participants as u32 + 1,
        retry_base_delay_ms: 1,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_joins_lose_no_updates() {
    const N: usize = 20;
    let db = TestDb::new();
    let stack = stack_on(db.open().await, contended_config(N));
    register(&stack, "popular", N as u32, 5).await;

    let mut handles = Vec::new();
    for i in 0..N {
        let engine = stack.engine.clone();
        handles.push(tokio::spawn(async move {
            engine.join("popular", &format!("p{}", i)).await
        }));
    }

    let mut positions = HashSet::new();
    let mut versions = HashSet::new();
    for handle in handles {
        let receipt = handle.await.unwrap().unwrap();
        positions.insert(receipt.standing.position);
        versions.insert(receipt.version);
    }

    assert_eq!(positions, (1..=N).collect::<HashSet<_>>());
    assert_eq!(versions, (1..=N as u64).collect::<HashSet<_>>());

    let owner = stack.engine.owner_snapshot("popular").await.unwrap();
    assert_eq!(owner.entries.len(), N);
    assert_eq!(owner.version, N as u64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_capacity_holds_under_contention() {
    const N: usize = 16;
    const CAPACITY: u32 = 5;
    let db = TestDb::new();
    let stack = stack_on(db.open().await, contended_config(N));
    register(&stack, "small", CAPACITY, 5).await;

    let mut handles = Vec::new();
    for i in 0..N {
        let engine = stack.engine.clone();
        handles.push(tokio::spawn(async move {
            engine.join("small", &format!("p{}", i)).await
        }));
    }

    let mut admitted = 0;
    let mut full = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => admitted += 1,
            Err(AppError::Domain(DomainError::QueueFull { .. })) => full += 1,
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(admitted, CAPACITY as usize);
    assert_eq!(full, N - CAPACITY as usize);
    assert_eq!(line_of(&stack, "small").await.len(), CAPACITY as usize);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_mixed_joins_and_leaves_keep_list_consistent() {
    const N: usize = 10;
    let db = TestDb::new();
    let stack = stack_on(db.open().await, contended_config(2 * N));
    register(&stack, "busy", 100, 5).await;

    // Half the line is already waiting; they leave while newcomers join
    for i in 0..N {
        stack.engine.join("busy", &format!("old{}", i)).await.unwrap();
    }

    let mut handles = Vec::new();
    for i in 0..N {
        let engine = stack.engine.clone();
        handles.push(tokio::spawn(async move {
            engine.leave("busy", &format!("old{}", i)).await
        }));
        let engine = stack.engine.clone();
        handles.push(tokio::spawn(async move {
            engine
                .join("busy", &format!("new{}", i))
                .await
                .map(|_| ())
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let owner = stack.engine.owner_snapshot("busy").await.unwrap();
    let ids: HashSet<_> = owner.participant_ids().into_iter().collect();
    let expected: HashSet<String> = (0..N).map(|i| format!("new{}", i)).collect();

    assert_eq!(ids.len(), N);
    assert!(ids.iter().all(|id| expected.contains(*id)));
    assert_eq!(owner.version, 3 * N as u64);
    let positions: Vec<_> = owner.entries.iter().map(|e| e.position).collect();
    assert_eq!(positions, (1..=N).collect::<Vec<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_queues_do_not_contend_with_each_other() {
    let db = TestDb::new();
    let stack = stack_on(
        db.open().await,
        EngineConfig {
            max_cas_attempts: 1,
            retry_base_delay_ms: 0,
        },
    );
    for q in 0..4 {
        register(&stack, &format!("q{}", q), 10, 5).await;
    }

    // One writer per queue: a single attempt must always be enough
    let mut handles = Vec::new();
    for q in 0..4 {
        let engine = stack.engine.clone();
        handles.push(tokio::spawn(async move {
            for p in 0..5 {
                engine
                    .join(&format!("q{}", q), &format!("p{}", p))
                    .await
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    for q in 0..4 {
        assert_eq!(line_of(&stack, &format!("q{}", q)).await.len(), 5);
    }
}
