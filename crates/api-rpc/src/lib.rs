//! JSON-RPC API Layer
//!
//! Implements the JSON-RPC 2.0 server for the Queueline waitlist engine:
//! request/response methods over HTTP and a change-feed subscription over
//! WebSocket, both on the same port.

pub mod error;
pub mod handler;
mod rate_limiter;
pub mod server;
pub mod types;

pub use server::{RpcServer, RpcServerConfig, StartedServer};
