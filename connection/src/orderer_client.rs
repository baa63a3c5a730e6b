use crate::error::{ConnectionError, Result};
use crate::transport::{build_channel, max_receive_message_length};
use fabric_protos::common::Envelope;
use fabric_protos::protos::atomic_broadcast_client::AtomicBroadcastClient;
use fabric_protos::protos::{BroadcastResponse, BroadcastStatusCode, DeliverResponse};
use fabric_uri::{ConnectionUri, OrdererUri};
use tokio_stream::StreamExt;
use tonic::transport::Channel;
use tonic::{Request, Streaming};
use tracing::instrument;

/// gRPC client for one ordering-service node: `Broadcast` for
/// transaction submission and `Deliver` for channel-config block reads.
#[derive(Clone)]
pub struct OrdererClient {
    uri: OrdererUri,
    client: AtomicBroadcastClient<Channel>,
}

impl OrdererClient {
    pub fn connect(uri: OrdererUri) -> Result<Self> {
        let endpoint = uri.endpoint();
        let channel = build_channel(endpoint)?;
        let mut client = AtomicBroadcastClient::new(channel);
        if let Some(limit) = max_receive_message_length(endpoint) {
            client = client.max_decoding_message_size(limit);
        }
        Ok(Self { uri, client })
    }

    pub fn uri(&self) -> &OrdererUri {
        &self.uri
    }

    /// Submit one signed envelope and wait for its `BroadcastResponse`.
    /// Retry-on-non-SUCCESS is the channel orchestrator's
    /// responsibility, not this client's.
    #[instrument(skip(self, envelope), fields(orderer = %self.uri))]
    pub async fn broadcast(&self, envelope: Envelope) -> Result<BroadcastResponse> {
        let mut client = self.client.clone();
        let request = Request::new(tokio_stream::once(envelope));
        let mut stream = client.broadcast(request).await?.into_inner();
        stream
            .next()
            .await
            .ok_or(ConnectionError::EmptyResponse)?
            .map_err(ConnectionError::from)
    }

    /// Open the orderer's `Deliver` stream (used for channel-config
    /// block reads, not ongoing block replay — that is the event
    /// hub's responsibility against a peer).
    pub async fn deliver_blocks(&self, envelope: Envelope) -> Result<Streaming<DeliverResponse>> {
        let mut client = self.client.clone();
        let request = Request::new(tokio_stream::once(envelope));
        let response = client.deliver_blocks(request).await?;
        Ok(response.into_inner())
    }
}

pub fn is_success(status: BroadcastStatusCode) -> bool {
    status == BroadcastStatusCode::Success
}
