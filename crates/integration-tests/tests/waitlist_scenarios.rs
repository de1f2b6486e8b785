//! Waitlist behavior end to end on a SQLite file database

mod common;

use common::{line_of, register, register_with_status, stack_on, TestDb, NOW};
use futures::StreamExt;
use queueline_core::application::{EngineConfig, Snapshot};
use queueline_core::domain::{ChangeKind, DomainError, QueueStatus, RemovalReason};
use queueline_core::port::{ChangeNotifier, QueueRegistry};
use queueline_core::AppError;
use std::time::Duration;

fn domain(err: AppError) -> DomainError {
    match err {
        AppError::Domain(e) => e,
        other => panic!("expected a domain error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_joins_up_to_capacity_then_queue_full() {
    let db = TestDb::new();
    let stack = stack_on(db.open().await, EngineConfig::default());
    register(&stack, "barber", 3, 10).await;

    for (i, p) in ["p1", "p2", "p3"].iter().enumerate() {
        let receipt = stack.engine.join("barber", p).await.unwrap();
        assert_eq!(receipt.standing.position, i + 1);
    }

    let err = domain(stack.engine.join("barber", "p4").await.unwrap_err());
    assert_eq!(err, DomainError::QueueFull { capacity: 3 });
    assert_eq!(line_of(&stack, "barber").await, ["p1", "p2", "p3"]);
}

#[tokio::test]
async fn test_leave_moves_later_participants_forward() {
    let db = TestDb::new();
    let stack = stack_on(db.open().await, EngineConfig::default());
    register(&stack, "barber", 5, 10).await;
    for p in ["p1", "p2", "p3"] {
        stack.engine.join("barber", p).await.unwrap();
    }
    let before = stack.engine.participant_snapshot("barber", "p3").await.unwrap();
    assert_eq!(before.standing.position, 3);

    stack.engine.leave("barber", "p2").await.unwrap();

    assert_eq!(line_of(&stack, "barber").await, ["p1", "p3"]);
    let after = stack.engine.participant_snapshot("barber", "p3").await.unwrap();
    assert_eq!(after.standing.position, 2);
    assert_eq!(after.version, before.version + 1);
}

#[tokio::test]
async fn test_duplicate_join_rejected() {
    let db = TestDb::new();
    let stack = stack_on(db.open().await, EngineConfig::default());
    register(&stack, "barber", 5, 10).await;

    stack.engine.join("barber", "p1").await.unwrap();
    let err = domain(stack.engine.join("barber", "p1").await.unwrap_err());

    assert!(matches!(err, DomainError::AlreadyJoined { .. }));
    assert_eq!(line_of(&stack, "barber").await, ["p1"]);
}

#[tokio::test]
async fn test_paused_queue_rejects_join() {
    let db = TestDb::new();
    let stack = stack_on(db.open().await, EngineConfig::default());
    register_with_status(&stack, "barber", 5, 10, QueueStatus::Paused).await;

    let err = domain(stack.engine.join("barber", "p1").await.unwrap_err());

    assert!(matches!(err, DomainError::QueueClosed { .. }));
    assert!(line_of(&stack, "barber").await.is_empty());
    assert_eq!(stack.engine.owner_snapshot("barber").await.unwrap().version, 0);
}

#[tokio::test]
async fn test_standing_reports_people_ahead_and_wait() {
    let db = TestDb::new();
    let stack = stack_on(db.open().await, EngineConfig::default());
    register(&stack, "barber", 5, 10).await;
    for p in ["p1", "p2", "p3"] {
        stack.engine.join("barber", p).await.unwrap();
    }

    match stack.engine.snapshot("barber", Some("p3")).await.unwrap() {
        Snapshot::Participant(view) => {
            assert!(view.in_queue);
            assert_eq!(view.standing.people_ahead, 2);
            assert_eq!(view.standing.estimated_wait_minutes, 20);
            assert_eq!(view.standing.estimated_ready_at, NOW + 20 * 60_000);
        }
        other => panic!("expected participant view, got {:?}", other),
    }
}

#[tokio::test]
async fn test_owner_removal_and_reopen() {
    let db = TestDb::new();
    let stack = stack_on(db.open().await, EngineConfig::default());
    register(&stack, "barber", 2, 15).await;
    stack.engine.join("barber", "p1").await.unwrap();
    stack.engine.join("barber", "p2").await.unwrap();

    stack
        .engine
        .remove_by_owner("barber", "p1", RemovalReason::Served)
        .await
        .unwrap();
    stack.repo.set_status("barber", QueueStatus::Closed).await.unwrap();

    // Leaving still works on a closed queue; joining does not
    stack.engine.leave("barber", "p2").await.unwrap();
    let err = domain(stack.engine.join("barber", "p3").await.unwrap_err());
    assert!(matches!(err, DomainError::QueueClosed { .. }));

    stack.repo.set_status("barber", QueueStatus::Open).await.unwrap();
    let receipt = stack.engine.join("barber", "p3").await.unwrap();
    assert_eq!(receipt.standing.position, 1);
    assert_eq!(receipt.version, 5);
}

#[tokio::test]
async fn test_waitlist_survives_restart() {
    let db = TestDb::new();

    {
        let stack = stack_on(db.open().await, EngineConfig::default());
        register(&stack, "barber", 5, 10).await;
        for p in ["p1", "p2", "p3"] {
            stack.engine.join("barber", p).await.unwrap();
        }
        stack.engine.leave("barber", "p1").await.unwrap();
        stack.pool.close().await;
    }

    let stack = stack_on(db.open().await, EngineConfig::default());
    let owner = stack.engine.owner_snapshot("barber").await.unwrap();

    assert_eq!(owner.participant_ids(), ["p2", "p3"]);
    assert_eq!(owner.version, 4);
    assert_eq!(owner.entries[0].joined_at, NOW);

    let receipt = stack.engine.join("barber", "p4").await.unwrap();
    assert_eq!(receipt.standing.position, 3);
}

#[tokio::test]
async fn test_subscribers_see_every_commit_with_full_list() {
    let db = TestDb::new();
    let stack = stack_on(db.open().await, EngineConfig::default());
    register(&stack, "barber", 5, 10).await;
    let mut events = stack.notifier.subscribe("barber");

    stack.engine.join("barber", "p1").await.unwrap();
    stack.engine.join("barber", "p2").await.unwrap();
    stack
        .engine
        .remove_by_owner("barber", "p1", RemovalReason::NoShow)
        .await
        .unwrap();

    let mut seen = Vec::new();
    for _ in 0..3 {
        let event = tokio::time::timeout(Duration::from_secs(2), events.next())
            .await
            .expect("event not delivered")
            .expect("stream ended");
        seen.push(event);
    }

    assert_eq!(
        seen.iter().map(|e| e.version).collect::<Vec<_>>(),
        [1, 2, 3]
    );
    assert_eq!(seen[2].kind, ChangeKind::Removed);
    assert_eq!(seen[2].reason, Some(RemovalReason::NoShow));
    assert_eq!(seen[2].entries.len(), 1);
    assert_eq!(seen[2].entries[0].participant_id, "p2");
}

#[tokio::test]
async fn test_queue_list_on_sqlite() {
    let db = TestDb::new();
    let stack = stack_on(db.open().await, EngineConfig::default());
    register(&stack, "b-queue", 4, 5).await;
    register(&stack, "a-queue", 2, 30).await;
    stack.engine.join("b-queue", "p1").await.unwrap();
    stack.engine.join("b-queue", "p2").await.unwrap();

    let queues = stack.engine.list_queues().await.unwrap();

    assert_eq!(queues.len(), 2);
    assert_eq!(queues[0].queue_id, "a-queue");
    assert_eq!(queues[0].people_in_line, 0);
    assert_eq!(queues[1].people_in_line, 2);
    assert_eq!(queues[1].estimated_wait_minutes, 10);
}

#[tokio::test]
async fn test_unknown_queue() {
    let db = TestDb::new();
    let stack = stack_on(db.open().await, EngineConfig::default());

    let err = domain(stack.engine.join("nowhere", "p1").await.unwrap_err());
    assert!(matches!(err, DomainError::QueueNotFound(_)));
}
