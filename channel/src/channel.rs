use crate::config::ChannelOptions;
use crate::error::{ChannelError, Result};
use crate::fan_out;
use crate::registry::Registry;
use crate::role::PeerRoles;
use crate::submission::{broadcast_with_retry, build_transaction_envelope, derive_tx_id};
use fabric_connection::{OrdererClient, PeerClient};
use fabric_crypto::{CryptoSuite, TrustStore};
use fabric_eventhub::{
    single_block_envelope, CommitListeners, CommitOutcome, EventHub, EventHubOptions, ReplayFrom,
};
use fabric_identity::SigningContext;
use fabric_proposal::{ProposalBuilder, ProposalKind};
use fabric_protos::common::Block;
use fabric_uri::{ConnectionUri, OrdererUri, PeerUri};
use futures::future::select_ok;
use prost::Message;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::{debug, info, instrument, warn};

/// Lifecycle state of a [`Channel`]: `CREATED` accepts
/// peer/orderer registration, `INITIALIZED` accepts transactions,
/// `SHUTDOWN` is terminal.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum ChannelState {
    Created = 0,
    Initialized = 1,
    Shutdown = 2,
}

impl ChannelState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Created,
            1 => Self::Initialized,
            _ => Self::Shutdown,
        }
    }
}

/// The result of a successfully committed transaction.
#[derive(Clone, Debug)]
pub struct TransactionResult {
    pub tx_id: String,
    pub block_number: u64,
    pub proposal_response_payload: Vec<u8>,
}

/// The central orchestrator for one channel: peer/orderer registry,
/// event-hub set, and the endorse -> order -> commit pipeline.
pub struct Channel {
    channel_id: String,
    signing_context: SigningContext,
    crypto_suite: CryptoSuite,
    options: ChannelOptions,
    pub(crate) registry: Registry,
    event_hubs: RwLock<Vec<EventHub>>,
    listeners: Arc<CommitListeners>,
    trust_store: TrustStore,
    state: Arc<AtomicU8>,
    discovery_task: RwLock<Option<JoinHandle<()>>>,
}

impl Channel {
    pub fn new(
        channel_id: impl Into<String>,
        signing_context: SigningContext,
        crypto_suite: CryptoSuite,
        options: ChannelOptions,
    ) -> Self {
        Self {
            channel_id: channel_id.into(),
            signing_context,
            crypto_suite,
            options,
            registry: Registry::new(),
            event_hubs: RwLock::new(Vec::new()),
            listeners: Arc::new(CommitListeners::new()),
            trust_store: TrustStore::new(),
            state: Arc::new(AtomicU8::new(ChannelState::Created as u8)),
            discovery_task: RwLock::new(None),
        }
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    pub fn state(&self) -> ChannelState {
        ChannelState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn require_state(&self, expected: ChannelState) -> Result<()> {
        if self.state() != expected {
            return Err(ChannelError::Argument(format!(
                "channel is not in the expected state for this operation (have {:?})",
                self.state()
            )));
        }
        Ok(())
    }

    /// Register a trust anchor (PEM-encoded CA/root certificate) this
    /// channel's signing identity must chain to before `initialize()`
    /// will proceed. A channel with no anchors added skips the check
    /// entirely, for callers who rely on transport-level mTLS alone.
    pub fn add_trust_anchor(&self, cert_pem: &str) -> Result<()> {
        self.trust_store
            .add_cert_pem(cert_pem)
            .map_err(|e| ChannelError::Argument(e.to_string()))
    }

    /// Join a peer to the channel, connecting lazily and registering it
    /// under `roles`. Peers carrying
    /// `EVENT_SOURCE` each get their own [`EventHub`], all sharing this
    /// channel's commit-listener registry.
    pub fn add_peer(&self, uri: PeerUri, roles: PeerRoles) -> Result<()> {
        self.require_state(ChannelState::Created)?;
        let client = PeerClient::connect(uri)?;
        if roles.contains(PeerRoles::EVENT_SOURCE) {
            let hub = EventHub::new(
                self.channel_id.clone(),
                client.clone(),
                EventHubOptions::default(),
                self.listeners.clone(),
            );
            self.event_hubs
                .write()
                .expect("event hub list lock poisoned")
                .push(hub);
        }
        self.registry.add_peer(client, roles);
        Ok(())
    }

    pub fn add_orderer(&self, uri: OrdererUri) -> Result<()> {
        self.require_state(ChannelState::Created)?;
        let client = OrdererClient::connect(uri)?;
        self.registry.add_orderer(client);
        Ok(())
    }

    /// Fetch the channel's latest block from the first reachable
    /// orderer, start every registered event hub's background
    /// connect/replay loop, and (if a trust anchor was registered)
    /// verify the signing identity chains to it.
    #[instrument(skip(self), fields(channel = %self.channel_id))]
    pub async fn initialize(&self) -> Result<()> {
        self.require_state(ChannelState::Created)?;

        if self.registry.peer_count() == 0 {
            return Err(ChannelError::Argument(
                "no peer registered on this channel".into(),
            ));
        }
        if self.registry.orderer_count() == 0 {
            return Err(ChannelError::Argument(
                "no orderer registered on this channel".into(),
            ));
        }

        if !self.trust_store.is_empty() {
            let cert_pem = &self.signing_context.identity().enrollment.cert_pem;
            if !self.trust_store.validate(cert_pem) {
                return Err(ChannelError::UntrustedIdentity);
            }
        }

        let _latest = self.fetch_config_block().await?;

        for hub in self
            .event_hubs
            .write()
            .expect("event hub list lock poisoned")
            .iter_mut()
        {
            hub.start(self.signing_context.clone(), self.crypto_suite.clone());
        }

        self.schedule_service_discovery();

        self.state.store(ChannelState::Initialized as u8, Ordering::SeqCst);
        info!(channel = %self.channel_id, "channel initialized");
        Ok(())
    }

    /// Spawn the periodic membership-refresh task against every
    /// `SERVICE_DISCOVERY` peer at `service_discovery_frequency_sec`.
    /// A no-op when discovery is disabled (`None` frequency) or no
    /// peer carries the role.
    fn schedule_service_discovery(&self) {
        let Some(freq_seconds) = self.options.service_discovery_freq_seconds else {
            return;
        };
        let peers = self.registry.peers_with_role(PeerRoles::SERVICE_DISCOVERY);
        if peers.is_empty() {
            return;
        }

        let channel_id = self.channel_id.clone();
        let state = self.state.clone();
        let deadline = self.options.proposal_wait_time;
        let interval = Duration::from_secs(freq_seconds);

        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                if ChannelState::from_u8(state.load(Ordering::SeqCst)) == ChannelState::Shutdown {
                    return;
                }
                for peer in &peers {
                    match peer.send_discovery(channel_id.clone(), deadline).await {
                        Ok(response) => {
                            debug!(
                                peer = %peer.uri(),
                                endpoints = ?response.peer_endpoints,
                                "service discovery refresh"
                            );
                        }
                        Err(err) => {
                            warn!(peer = %peer.uri(), error = %err, "service discovery request failed");
                        }
                    }
                }
            }
        });
        *self
            .discovery_task
            .write()
            .expect("discovery task lock poisoned") = Some(handle);
    }

    /// Read the newest block from any registered orderer, trying each
    /// in turn until one answers.
    pub async fn fetch_config_block(&self) -> Result<Block> {
        let orderers = self.registry.orderers();
        if orderers.is_empty() {
            return Err(ChannelError::Argument(
                "no orderer registered to fetch a config block from".into(),
            ));
        }

        let mut last_error = None;
        for orderer in &orderers {
            let envelope = single_block_envelope(
                &self.channel_id,
                ReplayFrom::Newest,
                &self.signing_context,
                &self.crypto_suite,
            );
            match self.read_one_block(orderer, envelope).await {
                Ok(block) => return Ok(block),
                Err(err) => last_error = Some(err),
            }
        }
        Err(last_error.unwrap_or(ChannelError::Argument("no orderer answered".into())))
    }

    async fn read_one_block(
        &self,
        orderer: &OrdererClient,
        envelope: fabric_protos::common::Envelope,
    ) -> Result<Block> {
        let deadline = self.options.channelconfig_wait_time;
        let mut stream = tokio::time::timeout(deadline, orderer.deliver_blocks(envelope))
            .await
            .map_err(|_| ChannelError::Connection(fabric_connection::ConnectionError::Timeout))??;
        let response = tokio::time::timeout(deadline, stream.next())
            .await
            .map_err(|_| ChannelError::Connection(fabric_connection::ConnectionError::Timeout))?
            .ok_or(ChannelError::Connection(
                fabric_connection::ConnectionError::EmptyResponse,
            ))?
            .map_err(fabric_connection::ConnectionError::from)?;
        match response.r#type {
            Some(fabric_protos::protos::deliver_response::Type::Block(block)) => Ok(block),
            _ => Err(ChannelError::Decode(
                "orderer did not return a block for the requested position".into(),
            )),
        }
    }

    /// Find this client's TLS client-certificate digest (hex-encoded
    /// SHA-256 over the DER cert) from whichever registered remote was
    /// configured with mTLS client credentials, for the proposal
    /// header's `tls_cert_hash` field.
    /// `None` when nothing on this channel uses a client certificate.
    fn tls_cert_hash(&self) -> Option<String> {
        self.registry
            .all_peers()
            .into_iter()
            .find_map(|(peer, _)| peer.uri().endpoint().tls_client_cert_digest())
            .or_else(|| {
                self.registry
                    .orderers()
                    .into_iter()
                    .find_map(|orderer| orderer.uri().endpoint().tls_client_cert_digest())
            })
            .map(hex::encode)
    }

    fn proposal_builder(&self) -> ProposalBuilder<'_> {
        let builder =
            ProposalBuilder::new(self.channel_id.clone(), &self.signing_context, &self.crypto_suite);
        match self.tls_cert_hash() {
            Some(hash) => builder.with_tls_cert_hash(hash),
            None => builder,
        }
    }

    /// Build, endorse, order and await commit of one chaincode
    /// operation.
    #[instrument(skip(self, kind), fields(channel = %self.channel_id))]
    pub async fn submit_transaction(&self, kind: ProposalKind) -> Result<TransactionResult> {
        self.require_state(ChannelState::Initialized)?;

        let builder = self.proposal_builder();
        let (tx_id, signed_proposal) = builder.build(kind)?;

        // Registered before broadcast, regardless of how many event
        // hubs observe it.
        let commit_rx = self.listeners.register(tx_id.clone());

        let endorsing_peers = self.registry.peers_with_role(PeerRoles::ENDORSING);
        if endorsing_peers.is_empty() {
            self.listeners.remove(&tx_id);
            return Err(ChannelError::Argument(
                "no endorsing peer registered on this channel".into(),
            ));
        }
        let outcomes = fan_out::dispatch(
            &endorsing_peers,
            &signed_proposal,
            self.options.proposal_wait_time,
        )
        .await;
        let validated = if self.options.proposal_consistency_validation {
            fan_out::validate_consistency(&outcomes)
        } else {
            fan_out::collect_successful(&outcomes)
        };
        let successful = match validated {
            Ok(successful) => successful,
            Err(err) => {
                self.listeners.remove(&tx_id);
                return Err(err);
            }
        };

        debug_assert_eq!(derive_tx_id(&signed_proposal).ok().as_deref(), Some(tx_id.as_str()));

        let envelope = match build_transaction_envelope(
            &signed_proposal,
            &successful,
            &self.signing_context,
            &self.crypto_suite,
        ) {
            Ok(envelope) => envelope,
            Err(err) => {
                self.listeners.remove(&tx_id);
                return Err(err);
            }
        };

        let orderers = self.registry.orderers();
        if let Err(err) = broadcast_with_retry(
            &orderers,
            envelope,
            self.options.orderer_broadcast_attempts,
            self.options.orderer_retry_wait_time,
            self.options.orderer_wait_time,
        )
        .await
        {
            self.listeners.remove(&tx_id);
            return Err(err);
        }

        let commit = tokio::time::timeout(self.options.transaction_cleanup_timeout, commit_rx).await;
        let outcome: CommitOutcome = match commit {
            Ok(Ok(outcome)) => outcome,
            // The sender side is dropped only by `shutdown()` draining the
            // registry; any other loss of the receiver is a timeout.
            Ok(Err(_)) if self.state() == ChannelState::Shutdown => {
                return Err(ChannelError::ShuttingDown);
            }
            Ok(Err(_)) | Err(_) => {
                self.listeners.remove(&tx_id);
                return Err(ChannelError::TransactionTimeout);
            }
        };

        if !outcome.is_success() {
            return Err(ChannelError::Transaction(format!(
                "{:?}",
                outcome.validation_code
            )));
        }

        let first_successful_payload = successful
            .first()
            .map(|r| r.payload.clone())
            .unwrap_or_default();
        Ok(TransactionResult {
            tx_id,
            block_number: outcome.block_number,
            proposal_response_payload: extract_response_payload(&first_successful_payload)
                .unwrap_or(first_successful_payload),
        })
    }

    /// Query a single chaincode-query peer, short-circuiting on the
    /// first success.
    pub async fn query(&self, kind: ProposalKind) -> Result<Vec<u8>> {
        self.query_with_role(kind, PeerRoles::CHAINCODE_QUERY, "chaincode-query")
            .await
    }

    /// Query a single `LEDGER_QUERY` peer (block height, transaction
    /// lookups, ...), short-circuiting on the first success.
    pub async fn query_ledger(&self, kind: ProposalKind) -> Result<Vec<u8>> {
        self.query_with_role(kind, PeerRoles::LEDGER_QUERY, "ledger-query")
            .await
    }

    async fn query_with_role(
        &self,
        kind: ProposalKind,
        role: PeerRoles,
        role_name: &str,
    ) -> Result<Vec<u8>> {
        self.require_state(ChannelState::Initialized)?;
        let builder = self.proposal_builder();
        let (_tx_id, signed_proposal) = builder.build(kind)?;

        let peers = self.registry.peers_with_role(role);
        if peers.is_empty() {
            return Err(ChannelError::Argument(format!(
                "no {role_name} peer registered on this channel"
            )));
        }

        let deadline = self.options.proposal_wait_time;
        let attempts = peers.iter().map(|peer| {
            let signed_proposal = signed_proposal.clone();
            Box::pin(async move {
                let response = peer.process_proposal(signed_proposal, deadline).await?;
                let status = response.response.as_ref().map(|r| r.status).unwrap_or(0);
                if (200..400).contains(&status) {
                    Ok(response.response.map(|r| r.payload).unwrap_or_default())
                } else {
                    Err(ChannelError::Argument(format!(
                        "query rejected with status {status}"
                    )))
                }
            })
        });
        match select_ok(attempts).await {
            Ok((payload, _rest)) => Ok(payload),
            Err(err) => Err(err),
        }
    }

    /// Move to `SHUTDOWN`: stop every event hub, stop service
    /// discovery, and drain outstanding commit listeners.
    pub fn shutdown(&self) {
        self.state.store(ChannelState::Shutdown as u8, Ordering::SeqCst);
        self.listeners.drain();
        if let Some(task) = self
            .discovery_task
            .write()
            .expect("discovery task lock poisoned")
            .take()
        {
            task.abort();
        }
        for hub in self
            .event_hubs
            .write()
            .expect("event hub list lock poisoned")
            .iter_mut()
        {
            hub.shutdown();
        }
    }

    pub fn peer_count(&self) -> usize {
        self.registry.peer_count()
    }

    pub fn orderer_count(&self) -> usize {
        self.registry.orderer_count()
    }
}

/// Decode a `ProposalResponsePayload` and return its embedded
/// `ChaincodeAction.response.payload`, if present — the actual
/// chaincode-returned bytes rather than the read/write set wrapper.
fn extract_response_payload(proposal_response_payload: &[u8]) -> Option<Vec<u8>> {
    let payload =
        fabric_protos::protos::ProposalResponsePayload::decode(proposal_response_payload).ok()?;
    let action = fabric_protos::protos::ChaincodeAction::decode(payload.extension.as_slice()).ok()?;
    action.response.map(|r| r.payload)
}
