use crate::block_filter::transactions_in_block;
use crate::error::{EventHubError, Result};
use crate::listener::{CommitListeners, CommitOutcome};
use crate::seek_envelope::{registration_envelope, ReplayFrom};
use crate::state::EventHubState;
use fabric_connection::PeerClient;
use fabric_crypto::CryptoSuite;
use fabric_identity::SigningContext;
use fabric_protos::protos::deliver_response::Type as DeliverResponseType;
use retry::delay::{jitter, Fibonacci};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::{error, instrument, warn};

/// Tunables for registration and reconnection: `peer.eventRegistration.wait_time`,
/// `peer.retry_wait_time`, `eventhub.reconnection_warning_rate`.
#[derive(Clone, Debug)]
pub struct EventHubOptions {
    pub register_wait_time: Duration,
    pub retry_wait_time: Duration,
    pub reconnection_warning_rate: u32,
}

impl Default for EventHubOptions {
    fn default() -> Self {
        Self {
            register_wait_time: Duration::from_millis(5_000),
            retry_wait_time: Duration::from_millis(500),
            reconnection_warning_rate: 50,
        }
    }
}

/// One peer's block-event connection: registration handshake,
/// reconnect-with-backoff, replay-cursor tracking, and commit-listener
/// dispatch.
pub struct EventHub {
    channel_id: String,
    peer: PeerClient,
    options: EventHubOptions,
    state: Arc<RwLock<EventHubState>>,
    last_block_num: Arc<AtomicU64>,
    has_seen_block: Arc<AtomicBool>,
    listeners: Arc<CommitListeners>,
    task: Option<JoinHandle<()>>,
}

impl EventHub {
    /// `listeners` is typically shared across every event hub on the
    /// same channel, so any one of them observing the committing block
    /// can resolve the waiter via the channel-level `commitListeners`
    /// map.
    pub fn new(
        channel_id: impl Into<String>,
        peer: PeerClient,
        options: EventHubOptions,
        listeners: Arc<CommitListeners>,
    ) -> Self {
        Self {
            channel_id: channel_id.into(),
            peer,
            options,
            state: Arc::new(RwLock::new(EventHubState::Disconnected)),
            last_block_num: Arc::new(AtomicU64::new(0)),
            has_seen_block: Arc::new(AtomicBool::new(false)),
            listeners,
            task: None,
        }
    }

    pub fn state(&self) -> EventHubState {
        *self.state.read().expect("event hub state lock poisoned")
    }

    pub fn listeners(&self) -> Arc<CommitListeners> {
        self.listeners.clone()
    }

    /// Register a commit listener for `tx_id`. Must happen before the
    /// corresponding envelope is broadcast.
    pub fn register_commit_listener(&self, tx_id: String) -> oneshot::Receiver<CommitOutcome> {
        self.listeners.register(tx_id)
    }

    /// Start the connect/register/replay/reconnect loop in the
    /// background. Idempotent: a second call while already running is
    /// a no-op.
    pub fn start(&mut self, signing_context: SigningContext, crypto_suite: CryptoSuite) {
        if self.task.is_some() {
            return;
        }
        let channel_id = self.channel_id.clone();
        let peer = self.peer.clone();
        let options = self.options.clone();
        let state = self.state.clone();
        let last_block_num = self.last_block_num.clone();
        let has_seen_block = self.has_seen_block.clone();
        let listeners = self.listeners.clone();

        let handle = tokio::spawn(async move {
            run_loop(
                channel_id,
                peer,
                options,
                state,
                last_block_num,
                has_seen_block,
                listeners,
                signing_context,
                crypto_suite,
            )
            .await;
        });
        self.task = Some(handle);
    }

    /// Move to `Shutdown` and stop the background task. Outstanding
    /// listeners are left registered for the caller to drain (the
    /// channel orchestrator surfaces `ShuttingDownError` for those).
    pub fn shutdown(&mut self) {
        *self.state.write().expect("event hub state lock poisoned") = EventHubState::Shutdown;
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_loop(
    channel_id: String,
    peer: PeerClient,
    options: EventHubOptions,
    state: Arc<RwLock<EventHubState>>,
    last_block_num: Arc<AtomicU64>,
    has_seen_block: Arc<AtomicBool>,
    listeners: Arc<CommitListeners>,
    signing_context: SigningContext,
    crypto_suite: CryptoSuite,
) {
    let consecutive_failures = AtomicU32::new(0);
    let mut backoff = Fibonacci::from_millis(options.retry_wait_time.as_millis() as u64).map(jitter);

    loop {
        if *state.read().expect("event hub state lock poisoned") == EventHubState::Shutdown {
            return;
        }
        *state.write().expect("event hub state lock poisoned") = EventHubState::Connecting;

        match connect_and_consume(
            &channel_id,
            &peer,
            &options,
            &state,
            &last_block_num,
            &has_seen_block,
            &listeners,
            &signing_context,
            &crypto_suite,
        )
        .await
        {
            Ok(()) => {
                // Stream ended cleanly (server closed it); reconnect.
                consecutive_failures.store(0, Ordering::SeqCst);
            }
            Err(EventHubError::MalformedBlock(reason)) => {
                // A block we can't parse means this peer's Deliver
                // stream is unusable going forward — reconnecting would
                // just observe the same corruption. Stop rather than
                // retry forever.
                error!(%channel_id, reason, "event hub stopping: peer delivered a malformed block");
                *state.write().expect("event hub state lock poisoned") = EventHubState::Shutdown;
                return;
            }
            Err(err) => {
                let failures = consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
                if failures % options.reconnection_warning_rate == 0 {
                    warn!(%channel_id, failures, error = %err, "event hub reconnecting repeatedly");
                }
            }
        }

        if *state.read().expect("event hub state lock poisoned") == EventHubState::Shutdown {
            return;
        }
        *state.write().expect("event hub state lock poisoned") = EventHubState::Disconnected;
        let delay = backoff.next().unwrap_or(options.retry_wait_time);
        tokio::time::sleep(delay).await;
    }
}

#[allow(clippy::too_many_arguments)]
#[instrument(skip_all, fields(channel = %channel_id))]
async fn connect_and_consume(
    channel_id: &str,
    peer: &PeerClient,
    options: &EventHubOptions,
    state: &Arc<RwLock<EventHubState>>,
    last_block_num: &Arc<AtomicU64>,
    has_seen_block: &Arc<AtomicBool>,
    listeners: &Arc<CommitListeners>,
    signing_context: &SigningContext,
    crypto_suite: &CryptoSuite,
) -> Result<()> {
    let from = if has_seen_block.load(Ordering::SeqCst) {
        ReplayFrom::BlockNumber(last_block_num.load(Ordering::SeqCst) + 1)
    } else {
        ReplayFrom::Newest
    };
    let envelope = registration_envelope(channel_id, from, signing_context, crypto_suite);

    let mut stream = tokio::time::timeout(options.register_wait_time, peer.deliver_blocks(envelope))
        .await
        .map_err(|_| EventHubError::RegistrationTimeout)??;

    let first = tokio::time::timeout(options.register_wait_time, stream.next())
        .await
        .map_err(|_| EventHubError::RegistrationTimeout)?;
    let Some(first) = first else {
        return Err(EventHubError::RegistrationTimeout);
    };
    *state.write().expect("event hub state lock poisoned") = EventHubState::Connected;
    handle_response(first?, last_block_num, has_seen_block, listeners)?;

    while let Some(response) = stream.next().await {
        if *state.read().expect("event hub state lock poisoned") == EventHubState::Shutdown {
            return Ok(());
        }
        handle_response(response?, last_block_num, has_seen_block, listeners)?;
    }
    Ok(())
}

fn handle_response(
    response: fabric_protos::protos::DeliverResponse,
    last_block_num: &Arc<AtomicU64>,
    has_seen_block: &Arc<AtomicBool>,
    listeners: &Arc<CommitListeners>,
) -> Result<()> {
    let block = match response.r#type {
        Some(DeliverResponseType::Block(block)) => block,
        Some(DeliverResponseType::Status(_)) | None => return Ok(()),
    };
    let header = block
        .header
        .as_ref()
        .ok_or_else(|| EventHubError::MalformedBlock("block has no header".into()))?;

    if has_seen_block.load(Ordering::SeqCst) {
        let expected = last_block_num.load(Ordering::SeqCst) + 1;
        if header.number != expected {
            warn!(
                expected,
                got = header.number,
                "event hub observed a replay gap"
            );
        }
    }

    let transactions = transactions_in_block(&block)?;
    for tx in transactions {
        listeners.dispatch(
            &tx.tx_id,
            CommitOutcome {
                block_number: header.number,
                validation_code: tx.validation_code,
            },
        );
    }

    last_block_num.store(header.number, Ordering::SeqCst);
    has_seen_block.store(true, Ordering::SeqCst);
    Ok(())
}
