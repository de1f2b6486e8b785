//! Simple SDK Example
//!
//! Registers a queue, joins two people, serves the first one.
//!
//! # Usage
//!
//! 1. Start the daemon:
//!    ```bash
//!    cargo run --package queueline-daemon
//!    ```
//!
//! 2. Run this example:
//!    ```bash
//!    cargo run --package queueline-sdk --example simple
//!    ```

use queueline_sdk::{QueuelineClient, RegisterQueueRequest, RemovalReason};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Queueline SDK - Simple Example");
    println!("==============================\n");

    // 1. Connect to daemon
    println!("1. Connecting to daemon...");
    let client = QueuelineClient::connect("http://127.0.0.1:9630").await?;
    println!("   ✓ Connected\n");

    // 2. Register a queue
    println!("2. Registering a queue...");
    let queue = client
        .register_queue(RegisterQueueRequest {
            queue_id: None,
            capacity: 10,
            estimated_service_minutes: 5,
            status: None,
        })
        .await?;
    println!("   ✓ Queue {} ({:?})\n", queue.queue_id, queue.status);

    // 3. Two people join
    println!("3. Joining...");
    for participant in ["alice", "bob"] {
        let receipt = client.join(&queue.queue_id, participant).await?;
        println!(
            "   ✓ {} is #{} (~{} min)",
            participant, receipt.standing.position, receipt.standing.estimated_wait_minutes
        );
    }
    println!();

    // 4. Serve alice, bob moves up
    println!("4. Serving alice...");
    client
        .remove(&queue.queue_id, "alice", RemovalReason::Served)
        .await?;
    let bob = client.participant_snapshot(&queue.queue_id, "bob").await?;
    println!("   ✓ bob is now #{}\n", bob.standing.position);

    // 5. Owner view
    let owner = client.owner_snapshot(&queue.queue_id).await?;
    println!("5. Waitlist at version {}:", owner.version);
    for entry in &owner.entries {
        println!("     {}. {}", entry.position, entry.participant_id);
    }

    println!("\n✓ Example completed successfully!");

    Ok(())
}
