//! RPC Method Handlers
//!
//! Thin adapters between JSON-RPC params and the waitlist engine.

use crate::error::{throttled, to_rpc_error};
use crate::rate_limiter::RateLimiter;
use crate::types::{
    IsMemberRequest, IsMemberResponse, JoinReceipt, JoinRequest, LeaveRequest,
    ListQueuesResponse, RegisterQueueRequest, RegisterQueueResponse, RemoveRequest,
    SetStatusRequest, SetStatusResponse, SnapshotRequest, SuccessResponse, WaitlistNotification,
};
use jsonrpsee::server::{PendingSubscriptionSink, SubscriptionMessage};
use jsonrpsee::types::ErrorObjectOwned;
use queueline_core::application::{QueueWaitlistEngine, Snapshot};
use queueline_core::domain::{QueueSettings, QueueStatus};
use queueline_core::port::{IdProvider, QueueRegistry};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    engine: QueueWaitlistEngine,
    registry: Arc<dyn QueueRegistry>,
    id_provider: Arc<dyn IdProvider>,
    rate_limiter: Arc<RateLimiter>,
}

impl RpcHandler {
    pub fn new(
        engine: QueueWaitlistEngine,
        registry: Arc<dyn QueueRegistry>,
        id_provider: Arc<dyn IdProvider>,
        rate_limiter: RateLimiter,
    ) -> Self {
        Self {
            engine,
            registry,
            id_provider,
            rate_limiter: Arc::new(rate_limiter),
        }
    }

    /// Rate limiting check for mutating calls (DoS protection)
    async fn throttle(&self, method: &str) -> Result<(), ErrorObjectOwned> {
        if self.rate_limiter.try_acquire() {
            Ok(())
        } else {
            warn!(
                method = method,
                available = self.rate_limiter.available(),
                "Rate limit exceeded"
            );
            Err(throttled())
        }
    }

    /// waitlist.join.v1
    pub async fn join(&self, params: JoinRequest) -> Result<JoinReceipt, ErrorObjectOwned> {
        self.throttle("waitlist.join.v1").await?;

        self.engine
            .join(&params.queue_id, &params.participant_id)
            .await
            .map_err(to_rpc_error)
    }

    /// waitlist.leave.v1
    pub async fn leave(&self, params: LeaveRequest) -> Result<SuccessResponse, ErrorObjectOwned> {
        self.throttle("waitlist.leave.v1").await?;

        self.engine
            .leave(&params.queue_id, &params.participant_id)
            .await
            .map_err(to_rpc_error)?;

        Ok(SuccessResponse { success: true })
    }

    /// waitlist.remove.v1
    pub async fn remove(&self, params: RemoveRequest) -> Result<SuccessResponse, ErrorObjectOwned> {
        self.throttle("waitlist.remove.v1").await?;

        self.engine
            .remove_by_owner(&params.queue_id, &params.participant_id, params.reason)
            .await
            .map_err(to_rpc_error)?;

        Ok(SuccessResponse { success: true })
    }

    /// waitlist.snapshot.v1
    pub async fn snapshot(&self, params: SnapshotRequest) -> Result<Snapshot, ErrorObjectOwned> {
        self.engine
            .snapshot(&params.queue_id, params.participant_id.as_deref())
            .await
            .map_err(to_rpc_error)
    }

    /// waitlist.is_member.v1
    pub async fn is_member(
        &self,
        params: IsMemberRequest,
    ) -> Result<IsMemberResponse, ErrorObjectOwned> {
        let in_queue = self
            .engine
            .is_member(&params.queue_id, &params.participant_id)
            .await
            .map_err(to_rpc_error)?;

        Ok(IsMemberResponse {
            queue_id: params.queue_id,
            participant_id: params.participant_id,
            in_queue,
        })
    }

    /// queue.list.v1
    pub async fn list_queues(&self) -> Result<ListQueuesResponse, ErrorObjectOwned> {
        let queues = self.engine.list_queues().await.map_err(to_rpc_error)?;
        Ok(ListQueuesResponse { queues })
    }

    /// queue.register.v1
    pub async fn register_queue(
        &self,
        params: RegisterQueueRequest,
    ) -> Result<RegisterQueueResponse, ErrorObjectOwned> {
        self.throttle("queue.register.v1").await?;

        let queue_id = params
            .queue_id
            .unwrap_or_else(|| self.id_provider.generate_id());
        let settings = QueueSettings::new(
            queue_id,
            params.capacity,
            params.estimated_service_minutes,
        )
        .map_err(|e| to_rpc_error(e.into()))?
        .with_status(params.status.unwrap_or(QueueStatus::Open));

        self.registry
            .register(&settings)
            .await
            .map_err(to_rpc_error)?;

        Ok(RegisterQueueResponse {
            queue_id: settings.id,
            status: settings.status,
        })
    }

    /// queue.set_status.v1
    pub async fn set_status(
        &self,
        params: SetStatusRequest,
    ) -> Result<SetStatusResponse, ErrorObjectOwned> {
        self.throttle("queue.set_status.v1").await?;

        self.registry
            .set_status(&params.queue_id, params.status)
            .await
            .map_err(to_rpc_error)?;

        Ok(SetStatusResponse {
            queue_id: params.queue_id,
            status: params.status,
        })
    }

    /// waitlist.subscribe.v1
    ///
    /// Sends the current snapshot first, then every newer committed change
    /// until the client unsubscribes or disconnects.
    pub async fn subscribe(
        &self,
        params: SnapshotRequest,
        pending: PendingSubscriptionSink,
    ) -> jsonrpsee::core::SubscriptionResult {
        // Subscribe before reading so no commit can fall in between
        let mut subscription = self.engine.subscribe(&params.queue_id);

        let snapshot = match self
            .engine
            .snapshot(&params.queue_id, params.participant_id.as_deref())
            .await
        {
            Ok(snapshot) => snapshot,
            Err(e) => {
                pending.reject(to_rpc_error(e)).await;
                return Ok(());
            }
        };
        subscription.resync_from(snapshot.version());

        let sink = pending.accept().await?;
        info!(
            queue_id = %params.queue_id,
            participant_id = ?params.participant_id,
            version = snapshot.version(),
            "Waitlist subscription opened"
        );

        let first = SubscriptionMessage::from_json(&WaitlistNotification::Snapshot { snapshot })?;
        sink.send(first).await?;

        loop {
            tokio::select! {
                _ = sink.closed() => break,
                next = subscription.next() => {
                    let Some(event) = next else { break };
                    let message = SubscriptionMessage::from_json(&WaitlistNotification::Changed {
                        event: event.as_ref().clone(),
                    })?;
                    if sink.send(message).await.is_err() {
                        break;
                    }
                }
            }
        }

        debug!(queue_id = %params.queue_id, "Waitlist subscription closed");
        Ok(())
    }
}
