//! JSON-RPC Server
//!
//! Implements the JSON-RPC 2.0 server over TCP on localhost. Plain calls
//! work over HTTP; `waitlist.subscribe.v1` needs a WebSocket connection to
//! the same address.

use crate::handler::RpcHandler;
use crate::rate_limiter::RateLimiter;
use crate::types::{
    IsMemberRequest, JoinRequest, LeaveRequest, RegisterQueueRequest, RemoveRequest,
    SetStatusRequest, SnapshotRequest,
};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::{ErrorObjectOwned, Params};
use jsonrpsee::RpcModule;
use queueline_core::application::QueueWaitlistEngine;
use queueline_core::port::{IdProvider, QueueRegistry};
use serde::de::DeserializeOwned;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 9630;

/// Default: 200 burst, 100 req/sec on mutating calls
const DEFAULT_RATE_LIMIT_BURST: u32 = 200;
const DEFAULT_RATE_LIMIT_PER_SEC: u32 = 100;

/// RPC Server Configuration
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    pub host: String,
    /// 0 picks a free port (see `StartedServer::local_addr`)
    pub port: u16,
    pub rate_limit_burst: u32,
    pub rate_limit_per_sec: u32,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
            rate_limit_burst: DEFAULT_RATE_LIMIT_BURST,
            rate_limit_per_sec: DEFAULT_RATE_LIMIT_PER_SEC,
        }
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to build server on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to register {method}: {reason}")]
    Register {
        method: &'static str,
        reason: String,
    },
}

/// A running server and the address it is bound to
pub struct StartedServer {
    pub local_addr: SocketAddr,
    pub handle: ServerHandle,
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

impl RpcServer {
    pub fn new(
        config: RpcServerConfig,
        engine: QueueWaitlistEngine,
        registry: Arc<dyn QueueRegistry>,
        id_provider: Arc<dyn IdProvider>,
    ) -> Self {
        let rate_limiter = RateLimiter::new(config.rate_limit_burst, config.rate_limit_per_sec);
        Self {
            config,
            handler: Arc::new(RpcHandler::new(
                engine,
                registry,
                id_provider,
                rate_limiter,
            )),
        }
    }

    /// Start the JSON-RPC server
    ///
    /// Security: binds to the configured host only (127.0.0.1 by default)
    pub async fn start(self) -> Result<StartedServer, ServerError> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        info!(
            host = %self.config.host,
            port = %self.config.port,
            "Starting JSON-RPC server on TCP"
        );

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local_addr = server
            .local_addr()
            .map_err(|source| ServerError::Bind { addr, source })?;

        let module = self.build_module()?;

        info!(local_addr = %local_addr, "JSON-RPC server started successfully");

        let handle = server.start(module);
        Ok(StartedServer { local_addr, handle })
    }

    fn build_module(&self) -> Result<RpcModule<()>, ServerError> {
        let mut module = RpcModule::new(());

        // Waitlist APIs
        let handler = self.handler.clone();
        module
            .register_async_method("waitlist.join.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: JoinRequest = parse_request(params)?;
                    handler.join(req).await
                }
            })
            .map_err(|e| register_error("waitlist.join.v1", e))?;

        let handler = self.handler.clone();
        module
            .register_async_method("waitlist.leave.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: LeaveRequest = parse_request(params)?;
                    handler.leave(req).await
                }
            })
            .map_err(|e| register_error("waitlist.leave.v1", e))?;

        let handler = self.handler.clone();
        module
            .register_async_method("waitlist.remove.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: RemoveRequest = parse_request(params)?;
                    handler.remove(req).await
                }
            })
            .map_err(|e| register_error("waitlist.remove.v1", e))?;

        let handler = self.handler.clone();
        module
            .register_async_method("waitlist.snapshot.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: SnapshotRequest = parse_request(params)?;
                    handler.snapshot(req).await
                }
            })
            .map_err(|e| register_error("waitlist.snapshot.v1", e))?;

        let handler = self.handler.clone();
        module
            .register_async_method("waitlist.is_member.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: IsMemberRequest = parse_request(params)?;
                    handler.is_member(req).await
                }
            })
            .map_err(|e| register_error("waitlist.is_member.v1", e))?;

        // Queue APIs
        let handler = self.handler.clone();
        module
            .register_async_method("queue.list.v1", move |_, _, _| {
                let handler = handler.clone();
                async move { handler.list_queues().await }
            })
            .map_err(|e| register_error("queue.list.v1", e))?;

        let handler = self.handler.clone();
        module
            .register_async_method("queue.register.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: RegisterQueueRequest = parse_request(params)?;
                    handler.register_queue(req).await
                }
            })
            .map_err(|e| register_error("queue.register.v1", e))?;

        let handler = self.handler.clone();
        module
            .register_async_method("queue.set_status.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: SetStatusRequest = parse_request(params)?;
                    handler.set_status(req).await
                }
            })
            .map_err(|e| register_error("queue.set_status.v1", e))?;

        // Change feed (WebSocket only)
        let handler = self.handler.clone();
        module
            .register_subscription(
                "waitlist.subscribe.v1",
                "waitlist.changed.v1",
                "waitlist.unsubscribe.v1",
                move |params, pending, _, _| {
                    let handler = handler.clone();
                    async move {
                        let req: SnapshotRequest = match parse_request(params) {
                            Ok(req) => req,
                            Err(e) => {
                                pending.reject(e).await;
                                return Ok(());
                            }
                        };
                        handler.subscribe(req, pending).await
                    }
                },
            )
            .map_err(|e| register_error("waitlist.subscribe.v1", e))?;

        Ok(module)
    }
}

/// Accept both `{...}` (named) and `[{...}]` (single positional) params
fn parse_request<T: DeserializeOwned>(params: Params<'_>) -> Result<T, ErrorObjectOwned> {
    if params.is_object() {
        params.parse()
    } else {
        params.one()
    }
}

fn register_error(method: &'static str, err: impl std::fmt::Display) -> ServerError {
    ServerError::Register {
        method,
        reason: err.to_string(),
    }
}
