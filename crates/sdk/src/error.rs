//! SDK Error Types

use jsonrpsee::core::ClientError;
use serde::Deserialize;
use thiserror::Error;

/// SDK Result type
pub type Result<T> = std::result::Result<T, SdkError>;

/// Error codes sent by the daemon
pub mod code {
    pub const VALIDATION_ERROR: i32 = 4000;
    pub const NOT_FOUND: i32 = 4001;
    pub const CONFLICT: i32 = 4002;
    pub const THROTTLED: i32 = 4003;
    pub const CONCURRENCY_EXHAUSTED: i32 = 4090;
    pub const QUEUE_FULL: i32 = 4101;
    pub const ALREADY_JOINED: i32 = 4102;
    pub const NOT_IN_QUEUE: i32 = 4103;
    pub const QUEUE_CLOSED: i32 = 4104;
}

/// SDK Error
#[derive(Debug, Error)]
pub enum SdkError {
    #[error("Queue is full: {0}")]
    QueueFull(String),

    #[error("Already in queue: {0}")]
    AlreadyJoined(String),

    #[error("Not in queue: {0}")]
    NotInQueue(String),

    #[error("Queue not accepting joins: {0}")]
    QueueClosed(String),

    #[error("Queue not found: {0}")]
    QueueNotFound(String),

    #[error("Queue already exists: {0}")]
    QueueExists(String),

    #[error("Too much contention, retry: {0}")]
    ConcurrencyExhausted(String),

    #[error("Rate limited: {0}")]
    Throttled(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("RPC error ({code}): {message}")]
    Rpc {
        code: i32,
        message: String,
        retryable: bool,
    },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl SdkError {
    /// Whether the same call may succeed if simply repeated
    pub fn is_retryable(&self) -> bool {
        match self {
            SdkError::ConcurrencyExhausted(_) | SdkError::Throttled(_) => true,
            SdkError::Transport(_) | SdkError::Connection(_) => true,
            SdkError::Rpc { retryable, .. } => *retryable,
            _ => false,
        }
    }
}

#[derive(Deserialize)]
struct ErrorData {
    #[serde(default)]
    retryable: bool,
}

impl From<ClientError> for SdkError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Call(call_err) => {
                let message = call_err.message().to_string();
                match call_err.code() {
                    code::QUEUE_FULL => SdkError::QueueFull(message),
                    code::ALREADY_JOINED => SdkError::AlreadyJoined(message),
                    code::NOT_IN_QUEUE => SdkError::NotInQueue(message),
                    code::QUEUE_CLOSED => SdkError::QueueClosed(message),
                    code::NOT_FOUND => SdkError::QueueNotFound(message),
                    code::CONFLICT => SdkError::QueueExists(message),
                    code::CONCURRENCY_EXHAUSTED => SdkError::ConcurrencyExhausted(message),
                    code::THROTTLED => SdkError::Throttled(message),
                    code::VALIDATION_ERROR => SdkError::Validation(message),
                    other => {
                        let retryable = call_err
                            .data()
                            .and_then(|raw| serde_json::from_str::<ErrorData>(raw.get()).ok())
                            .map(|data| data.retryable)
                            .unwrap_or(false);
                        SdkError::Rpc {
                            code: other,
                            message,
                            retryable,
                        }
                    }
                }
            }
            ClientError::Transport(e) => SdkError::Transport(format!("Transport error: {}", e)),
            ClientError::RestartNeeded(_) => {
                SdkError::Connection("Connection restart needed".to_string())
            }
            ClientError::ParseError(e) => SdkError::Serialization(e),
            _ => SdkError::Other(e.to_string()),
        }
    }
}
