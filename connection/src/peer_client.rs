use crate::error::{ConnectionError, Result};
use crate::retry::with_retry;
use crate::transport::{build_channel, max_receive_message_length};
use fabric_protos::common::Envelope;
use fabric_protos::protos::deliver_client::DeliverClient;
use fabric_protos::protos::discovery_client::DiscoveryClient;
use fabric_protos::protos::endorser_client::EndorserClient;
use fabric_protos::protos::{
    DeliverResponse, DiscoveryRequest, DiscoveryResponse, ProposalResponse, SignedProposal,
};
use fabric_uri::{ConnectionUri, PeerUri};
use std::time::Duration;
use tonic::transport::Channel;
use tonic::{Request, Streaming};
use tracing::instrument;

/// gRPC client for one endorsing peer: `Endorser.ProcessProposal` plus
/// the `Deliver` block-event stream the event hub consumes. One
/// instance per peer, cheap to clone (the underlying
/// `tonic::transport::Channel` is reference-counted).
#[derive(Clone)]
pub struct PeerClient {
    uri: PeerUri,
    endorser: EndorserClient<Channel>,
    deliver: DeliverClient<Channel>,
    discovery: DiscoveryClient<Channel>,
}

impl PeerClient {
    pub fn connect(uri: PeerUri) -> Result<Self> {
        let endpoint = uri.endpoint();
        let channel = build_channel(endpoint)?;
        let mut endorser = EndorserClient::new(channel.clone());
        let mut deliver = DeliverClient::new(channel.clone());
        let mut discovery = DiscoveryClient::new(channel);
        if let Some(limit) = max_receive_message_length(endpoint) {
            endorser = endorser.max_decoding_message_size(limit);
            deliver = deliver.max_decoding_message_size(limit);
            discovery = discovery.max_decoding_message_size(limit);
        }
        Ok(Self {
            uri,
            endorser,
            deliver,
            discovery,
        })
    }

    pub fn uri(&self) -> &PeerUri {
        &self.uri
    }

    /// Simulate a proposal against this peer, enforcing `deadline` as
    /// a hard upper bound regardless of what the transport itself does.
    #[instrument(skip(self, signed_proposal), fields(peer = %self.uri))]
    pub async fn process_proposal(
        &self,
        signed_proposal: SignedProposal,
        deadline: Duration,
    ) -> Result<ProposalResponse> {
        let mut client = self.endorser.clone();
        let response = tokio::time::timeout(deadline, async move {
            client
                .process_proposal(Request::new(signed_proposal))
                .await
        })
        .await
        .map_err(|_| ConnectionError::Timeout)??;
        Ok(response.into_inner())
    }

    /// As [`Self::process_proposal`], retrying transient gRPC failures
    /// (`UNAVAILABLE`, `DEADLINE_EXCEEDED`, ...) with jittered backoff.
    pub async fn process_proposal_with_retry(
        &self,
        signed_proposal: SignedProposal,
        deadline: Duration,
        attempts: usize,
        base_delay: Duration,
    ) -> Result<ProposalResponse> {
        with_retry(attempts, base_delay, || {
            self.process_proposal(signed_proposal.clone(), deadline)
        })
        .await
    }

    /// Open the block-event stream, registering `envelope` (a signed
    /// `SeekInfo`) as Fabric's `Deliver` handshake.
    pub async fn deliver_blocks(&self, envelope: Envelope) -> Result<Streaming<DeliverResponse>> {
        let mut client = self.deliver.clone();
        let request = Request::new(tokio_stream::once(envelope));
        let response = client.deliver_blocks(request).await?;
        Ok(response.into_inner())
    }

    /// Ask this peer for its current view of the channel's endorsing
    /// peer set.
    #[instrument(skip(self), fields(peer = %self.uri))]
    pub async fn send_discovery(
        &self,
        channel_id: String,
        deadline: Duration,
    ) -> Result<DiscoveryResponse> {
        let mut client = self.discovery.clone();
        let response = tokio::time::timeout(deadline, async move {
            client
                .discover(Request::new(DiscoveryRequest { channel_id }))
                .await
        })
        .await
        .map_err(|_| ConnectionError::Timeout)??;
        Ok(response.into_inner())
    }
}
