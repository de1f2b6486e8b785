//! Queueline CLI - Command-line client for the Queueline waitlist engine
//!
//! Participants join/leave, owners serve or drop people and manage queues.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9630";

#[derive(Parser)]
#[command(name = "queueline")]
#[command(about = "Queueline waitlist CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "QUEUELINE_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Join the end of a queue
    Join {
        /// Queue ID
        queue: String,
        /// Participant ID
        participant: String,
    },

    /// Leave a queue
    Leave {
        queue: String,
        participant: String,
    },

    /// Owner: mark a participant as served
    Serve {
        queue: String,
        participant: String,
    },

    /// Owner: remove a participant who did not show up
    NoShow {
        queue: String,
        participant: String,
    },

    /// Show the waitlist (owner view), or one participant's standing
    Show {
        queue: String,

        /// Participant ID (omit for the full list)
        #[arg(short, long)]
        participant: Option<String>,
    },

    /// List all queues
    Queues,

    /// Register a new queue
    CreateQueue {
        /// Queue ID (generated when omitted)
        #[arg(long)]
        id: Option<String>,

        /// Maximum number of people waiting at once
        #[arg(short, long)]
        capacity: u32,

        /// Estimated minutes to serve one person
        #[arg(short = 'm', long)]
        service_minutes: u32,
    },

    /// Open, pause or close a queue
    Status {
        queue: String,

        #[arg(value_enum)]
        action: StatusAction,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum StatusAction {
    Open,
    Pause,
    Close,
}

impl StatusAction {
    fn wire_status(self) -> &'static str {
        match self {
            StatusAction::Open => "open",
            StatusAction::Pause => "paused",
            StatusAction::Close => "closed",
        }
    }
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: u64,
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
    #[serde(default)]
    data: Option<ErrorData>,
}

#[derive(Deserialize)]
struct ErrorData {
    #[serde(default)]
    retryable: bool,
}

#[derive(Deserialize, Tabled)]
struct QueueRow {
    queue_id: String,
    status: String,
    capacity: u32,
    people_in_line: usize,
    estimated_wait_minutes: u64,
    version: u64,
}

#[derive(Deserialize, Tabled)]
struct EntryRow {
    position: usize,
    participant_id: String,
    joined_at: i64,
    estimated_wait_minutes: u64,
}

#[derive(Deserialize, Tabled)]
struct StandingRow {
    position: usize,
    people_ahead: usize,
    estimated_wait_minutes: u64,
    estimated_ready_at: i64,
}

async fn call_rpc(url: &str, method: &str, params: Value) -> Result<Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to daemon")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        let retryable = error.data.map(|d| d.retryable).unwrap_or(false);
        if retryable {
            anyhow::bail!(
                "RPC error ({}): {} (temporary, try again)",
                error.code,
                error.message
            );
        }
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

async fn remove(url: &str, queue: &str, participant: &str, reason: &str) -> Result<()> {
    let params = json!({
        "queue_id": queue,
        "participant_id": participant,
        "reason": reason,
    });
    call_rpc(url, "waitlist.remove.v1", params).await?;
    Ok(())
}

fn print_standing(result: Value) -> Result<()> {
    let standing: StandingRow = serde_json::from_value(result)?;
    println!("{}", Table::new(vec![standing]));
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Join { queue, participant } => {
            let params = json!({
                "queue_id": queue,
                "participant_id": participant,
            });

            let result = call_rpc(&cli.rpc_url, "waitlist.join.v1", params).await?;

            println!(
                "{}",
                format!("✓ {} joined {}", participant, queue).green().bold()
            );
            println!();
            print_standing(result)?;
        }

        Commands::Leave { queue, participant } => {
            let params = json!({
                "queue_id": queue,
                "participant_id": participant,
            });

            call_rpc(&cli.rpc_url, "waitlist.leave.v1", params).await?;

            println!(
                "{}",
                format!("✓ {} left {}", participant, queue).green().bold()
            );
        }

        Commands::Serve { queue, participant } => {
            remove(&cli.rpc_url, &queue, &participant, "served").await?;
            println!("{}", format!("✓ {} served", participant).green().bold());
        }

        Commands::NoShow { queue, participant } => {
            remove(&cli.rpc_url, &queue, &participant, "noShow").await?;
            println!(
                "{}",
                format!("✓ {} removed (no-show)", participant).yellow().bold()
            );
        }

        Commands::Show { queue, participant } => {
            let params = json!({
                "queue_id": queue,
                "participant_id": participant,
            });

            let snapshot = call_rpc(&cli.rpc_url, "waitlist.snapshot.v1", params).await?;

            match participant {
                Some(participant) => {
                    let in_queue = snapshot["in_queue"].as_bool().unwrap_or(false);
                    println!(
                        "{} {} {}",
                        participant.cyan().bold(),
                        "in".bold(),
                        queue.cyan().bold()
                    );
                    println!("  {} {}", "Status:".bold(), snapshot["status"]);
                    if in_queue {
                        println!("  {} {}", "In line:".bold(), "yes".green());
                    } else {
                        println!(
                            "  {} {} (showing the standing if you joined now)",
                            "In line:".bold(),
                            "no".yellow()
                        );
                    }
                    println!();
                    print_standing(snapshot)?;
                }
                None => {
                    let entries: Vec<EntryRow> =
                        serde_json::from_value(snapshot["entries"].clone())?;
                    println!(
                        "{} {} (version {})",
                        "Waitlist".cyan().bold(),
                        queue.cyan().bold(),
                        snapshot["version"]
                    );
                    println!(
                        "  {} {}  {} {}",
                        "Status:".bold(),
                        snapshot["queue"]["status"],
                        "Capacity:".bold(),
                        snapshot["queue"]["capacity"]
                    );
                    println!();
                    if entries.is_empty() {
                        println!("{}", "Nobody is waiting".yellow());
                    } else {
                        println!("{}", Table::new(entries));
                    }
                }
            }
        }

        Commands::Queues => {
            let result = call_rpc(&cli.rpc_url, "queue.list.v1", json!({})).await?;
            let queues: Vec<QueueRow> = serde_json::from_value(result["queues"].clone())?;

            if queues.is_empty() {
                println!("{}", "No queues registered".yellow());
            } else {
                println!("{}", Table::new(queues));
            }
        }

        Commands::CreateQueue {
            id,
            capacity,
            service_minutes,
        } => {
            let params = json!({
                "queue_id": id,
                "capacity": capacity,
                "estimated_service_minutes": service_minutes,
            });

            let result = call_rpc(&cli.rpc_url, "queue.register.v1", params).await?;

            println!("{}", "✓ Queue created".green().bold());
            println!("  {} {}", "Queue ID:".bold(), result["queue_id"]);
            println!("  {} {}", "Status:".bold(), result["status"]);
        }

        Commands::Status { queue, action } => {
            let params = json!({
                "queue_id": queue,
                "status": action.wire_status(),
            });

            call_rpc(&cli.rpc_url, "queue.set_status.v1", params).await?;

            println!(
                "{}",
                format!("✓ Queue {} is now {}", queue, action.wire_status())
                    .green()
                    .bold()
            );
        }
    }

    Ok(())
}
