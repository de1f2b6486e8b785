//! Queueline Client Implementation

use crate::error::{Result, SdkError};
use crate::types::{
    IsMemberResponse, JoinReceipt, ListQueuesResponse, MembershipRequest, OwnerSnapshot,
    ParticipantSnapshot, QueueStatus, QueueSummary, RegisterQueueRequest, RegisterQueueResponse,
    RemovalReason, RemoveRequest, SetStatusRequest, SetStatusResponse, Snapshot, SnapshotRequest,
    SuccessResponse,
};
use jsonrpsee::core::client::ClientT;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::rpc_params;
use std::time::Duration;

/// Queueline daemon client
///
/// # Example
///
/// ```no_run
/// use queueline_sdk::QueuelineClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = QueuelineClient::connect("http://127.0.0.1:9630").await?;
/// # Ok(())
/// # }
/// ```
pub struct QueuelineClient {
    client: HttpClient,
}

impl QueuelineClient {
    /// Connect to the daemon
    ///
    /// # Arguments
    ///
    /// * `url` - RPC endpoint URL (e.g., `http://127.0.0.1:9630`)
    pub async fn connect(url: impl AsRef<str>) -> Result<Self> {
        let url = url.as_ref();

        let client = HttpClientBuilder::default()
            .request_timeout(Duration::from_secs(30))
            .build(url)
            .map_err(|e| SdkError::Connection(format!("Failed to create client: {}", e)))?;

        Ok(Self { client })
    }

    /// Join the end of a queue
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use queueline_sdk::{QueuelineClient, SdkError};
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let client = QueuelineClient::connect("http://127.0.0.1:9630").await?;
    /// match client.join("barber-shop", "alice").await {
    ///     Ok(receipt) => println!("You are number {}", receipt.standing.position),
    ///     Err(SdkError::QueueFull(_)) => println!("Try again later"),
    ///     Err(e) => return Err(e.into()),
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn join(&self, queue_id: &str, participant_id: &str) -> Result<JoinReceipt> {
        let params = rpc_params![MembershipRequest {
            queue_id,
            participant_id
        }];
        let receipt: JoinReceipt = self.client.request("waitlist.join.v1", params).await?;

        Ok(receipt)
    }

    /// Leave a queue
    pub async fn leave(&self, queue_id: &str, participant_id: &str) -> Result<()> {
        let params = rpc_params![MembershipRequest {
            queue_id,
            participant_id
        }];
        let _: SuccessResponse = self.client.request("waitlist.leave.v1", params).await?;

        Ok(())
    }

    /// Owner removal (served or no-show)
    pub async fn remove(
        &self,
        queue_id: &str,
        participant_id: &str,
        reason: RemovalReason,
    ) -> Result<()> {
        let params = rpc_params![RemoveRequest {
            queue_id,
            participant_id,
            reason,
        }];
        let _: SuccessResponse = self.client.request("waitlist.remove.v1", params).await?;

        Ok(())
    }

    /// One participant's standing
    ///
    /// For a participant not in line, the standing they would get by joining now.
    pub async fn participant_snapshot(
        &self,
        queue_id: &str,
        participant_id: &str,
    ) -> Result<ParticipantSnapshot> {
        match self.snapshot(queue_id, Some(participant_id)).await? {
            Snapshot::Participant(view) => Ok(view),
            Snapshot::Owner(_) => Err(SdkError::UnexpectedResponse(
                "owner view returned for a participant request".to_string(),
            )),
        }
    }

    /// Full ordered list for the queue owner
    pub async fn owner_snapshot(&self, queue_id: &str) -> Result<OwnerSnapshot> {
        match self.snapshot(queue_id, None).await? {
            Snapshot::Owner(view) => Ok(view),
            Snapshot::Participant(_) => Err(SdkError::UnexpectedResponse(
                "participant view returned for an owner request".to_string(),
            )),
        }
    }

    async fn snapshot(&self, queue_id: &str, participant_id: Option<&str>) -> Result<Snapshot> {
        let params = rpc_params![SnapshotRequest {
            queue_id,
            participant_id
        }];
        let snapshot: Snapshot = self.client.request("waitlist.snapshot.v1", params).await?;

        Ok(snapshot)
    }

    pub async fn is_member(&self, queue_id: &str, participant_id: &str) -> Result<bool> {
        let params = rpc_params![MembershipRequest {
            queue_id,
            participant_id
        }];
        let response: IsMemberResponse =
            self.client.request("waitlist.is_member.v1", params).await?;

        Ok(response.in_queue)
    }

    pub async fn list_queues(&self) -> Result<Vec<QueueSummary>> {
        let response: ListQueuesResponse = self.client.request("queue.list.v1", rpc_params![]).await?;

        Ok(response.queues)
    }

    /// Register a queue with an empty waitlist
    pub async fn register_queue(
        &self,
        request: RegisterQueueRequest,
    ) -> Result<RegisterQueueResponse> {
        let params = rpc_params![request];
        let response: RegisterQueueResponse =
            self.client.request("queue.register.v1", params).await?;

        Ok(response)
    }

    /// Open, pause or close a queue
    pub async fn set_status(&self, queue_id: &str, status: QueueStatus) -> Result<QueueStatus> {
        let params = rpc_params![SetStatusRequest { queue_id, status }];
        let response: SetStatusResponse =
            self.client.request("queue.set_status.v1", params).await?;

        Ok(response.status)
    }
}
