use crate::config::ClientConfig;
use crate::error::{FabricError, Result};
use fabric_channel::{Channel, ChannelOptions};
use fabric_crypto::CryptoSuite;
use fabric_identity::{Identity, SigningContext};
use fabric_uri::{OrdererUri, PeerUri};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::instrument;

/// The top-level facade: owns the crypto suite, the
/// caller's bound signing identity, and the registry of channels this
/// client has joined (`channels` map guarded by an `RwLock`).
pub struct HFClient {
    config: ClientConfig,
    crypto_suite: CryptoSuite,
    signing_context: SigningContext,
    channels: RwLock<HashMap<String, Arc<Channel>>>,
}

impl HFClient {
    /// Build a crypto suite from `config` and bind `identity` into a
    /// signing context, validating the key/certificate invariant once.
    pub fn new(config: ClientConfig, identity: Identity) -> Result<Self> {
        let crypto_suite = CryptoSuite::new(config.crypto_suite_options());
        let signing_context = SigningContext::bind(identity, &crypto_suite)?;
        Ok(Self {
            config,
            crypto_suite,
            signing_context,
            channels: RwLock::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn crypto_suite(&self) -> &CryptoSuite {
        &self.crypto_suite
    }

    pub fn signing_context(&self) -> &SigningContext {
        &self.signing_context
    }

    /// Create and register a new, empty `Channel` under this client
    /// (state `Created` — peers and orderers still need to be added
    /// before `initialize()`).
    #[instrument(skip(self, channel_id))]
    pub fn new_channel(&self, channel_id: impl Into<String>) -> Result<Arc<Channel>> {
        let channel_id = channel_id.into();
        let mut channels = self.channels.write().expect("channel registry lock poisoned");
        if channels.contains_key(&channel_id) {
            return Err(FabricError::DuplicateChannel(channel_id));
        }
        let options = ChannelOptions {
            proposal_wait_time: self.config.proposal_wait_time,
            channelconfig_wait_time: self.config.channelconfig_wait_time,
            transaction_cleanup_timeout: self.config.transaction_cleanup_timeout,
            orderer_retry_wait_time: self.config.orderer_retry_wait_time,
            orderer_wait_time: self.config.orderer_wait_time,
            proposal_consistency_validation: self.config.proposal_consistency_validation,
            service_discovery_freq_seconds: Some(self.config.service_discovery_frequency_sec),
            ..ChannelOptions::default()
        };
        let channel = Arc::new(Channel::new(
            channel_id.clone(),
            self.signing_context.clone(),
            self.crypto_suite.clone(),
            options,
        ));
        channels.insert(channel_id, channel.clone());
        Ok(channel)
    }

    pub fn channel(&self, channel_id: &str) -> Result<Arc<Channel>> {
        self.channels
            .read()
            .expect("channel registry lock poisoned")
            .get(channel_id)
            .cloned()
            .ok_or_else(|| FabricError::UnknownChannel(channel_id.to_string()))
    }

    pub fn channel_ids(&self) -> Vec<String> {
        self.channels
            .read()
            .expect("channel registry lock poisoned")
            .keys()
            .cloned()
            .collect()
    }

    /// Drop and shut down a channel: drains outstanding commit
    /// listeners, then closes each peer/orderer/event-hub.
    pub fn shutdown_channel(&self, channel_id: &str) {
        if let Some(channel) = self
            .channels
            .write()
            .expect("channel registry lock poisoned")
            .remove(channel_id)
        {
            channel.shutdown();
        }
    }
}

/// Parse `grpc(s)://host:port` into a [`PeerUri`] for use with
/// [`fabric_channel::Channel::add_peer`].
pub fn parse_peer_uri(url: &str) -> Result<PeerUri> {
    PeerUri::parse(url).map_err(FabricError::from)
}

/// Parse `grpc(s)://host:port` into an [`OrdererUri`] for use with
/// [`fabric_channel::Channel::add_orderer`].
pub fn parse_orderer_uri(url: &str) -> Result<OrdererUri> {
    OrdererUri::parse(url).map_err(FabricError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabric_crypto::{CryptoSuite, CryptoSuiteOptions};
    use fabric_identity::Enrollment;

    fn test_identity() -> Identity {
        let suite = CryptoSuite::new(CryptoSuiteOptions::default());
        let key = suite.key_gen();
        let cert_pem = fabric_crypto::dev_self_signed_cert(&key, "user1.org1.example.com");
        Identity::new("user1", "Org1MSP", Enrollment { cert_pem, key })
    }

    #[test]
    fn new_channel_rejects_a_duplicate_name() {
        let client = HFClient::new(ClientConfig::default(), test_identity()).unwrap();
        client.new_channel("mychannel").unwrap();
        assert!(matches!(
            client.new_channel("mychannel"),
            Err(FabricError::DuplicateChannel(name)) if name == "mychannel"
        ));
    }

    #[test]
    fn channel_lookup_fails_for_an_unregistered_name() {
        let client = HFClient::new(ClientConfig::default(), test_identity()).unwrap();
        assert!(matches!(client.channel("nope"), Err(FabricError::UnknownChannel(_))));
    }

    #[test]
    fn shutdown_channel_removes_it_from_the_registry() {
        let client = HFClient::new(ClientConfig::default(), test_identity()).unwrap();
        client.new_channel("mychannel").unwrap();
        client.shutdown_channel("mychannel");
        assert!(client.channel_ids().is_empty());
    }
}
