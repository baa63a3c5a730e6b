use fabric_crypto::{CryptoSuiteOptions, HashAlgorithm, SecurityLevel};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Every configuration key, resolved through the env > file > default
/// override chain.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub proposal_wait_time: Duration,
    pub channelconfig_wait_time: Duration,
    pub transaction_cleanup_timeout: Duration,
    pub orderer_retry_wait_time: Duration,
    pub orderer_wait_time: Duration,
    pub peer_event_registration_wait_time: Duration,
    pub peer_retry_wait_time: Duration,
    pub eventhub_reconnection_warning_rate: u32,
    pub channel_genesisblock_wait_time: Duration,
    pub security_level: SecurityLevel,
    pub hash_algorithm: HashAlgorithm,
    pub signature_algorithm: String,
    pub proposal_consistency_validation: bool,
    pub service_discovery_frequency_sec: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            proposal_wait_time: Duration::from_millis(30_000),
            channelconfig_wait_time: Duration::from_millis(15_000),
            transaction_cleanup_timeout: Duration::from_millis(600_000),
            orderer_retry_wait_time: Duration::from_millis(200),
            orderer_wait_time: Duration::from_millis(10_000),
            peer_event_registration_wait_time: Duration::from_millis(5_000),
            peer_retry_wait_time: Duration::from_millis(500),
            eventhub_reconnection_warning_rate: 50,
            channel_genesisblock_wait_time: Duration::from_millis(5_000),
            security_level: SecurityLevel::S256,
            hash_algorithm: HashAlgorithm::Sha2,
            signature_algorithm: "SHA256withECDSA".to_string(),
            proposal_consistency_validation: true,
            service_discovery_frequency_sec: 120,
        }
    }
}

impl ClientConfig {
    /// Resolve the override chain: explicit file values win over the
    /// built-in default, then `FABRIC_<SCREAMING_SNAKE_KEY>` env vars
    /// win over the file: env var > on-disk key-value file > built-in
    /// default.
    pub fn from_env_and_file(path: Option<&Path>) -> crate::error::Result<Self> {
        let mut config = Self::default();
        let file_values = match path {
            Some(path) => load_file(path)?,
            None => HashMap::new(),
        };
        apply(&mut config, &file_values);
        apply(&mut config, &env_values());
        Ok(config)
    }

    pub fn crypto_suite_options(&self) -> CryptoSuiteOptions {
        CryptoSuiteOptions {
            security_level: self.security_level,
            hash_algorithm: self.hash_algorithm,
        }
    }
}

fn load_file(path: &Path) -> crate::error::Result<HashMap<String, String>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| crate::error::FabricError::Config(format!("{}: {e}", path.display())))?;
    let table: toml::Table = toml::from_str(&contents)
        .map_err(|e| crate::error::FabricError::Config(format!("{}: {e}", path.display())))?;
    Ok(table
        .into_iter()
        .filter_map(|(k, v)| scalar_to_string(&v).map(|s| (k, s)))
        .collect())
}

fn scalar_to_string(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(f) => Some(f.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}

fn env_values() -> HashMap<String, String> {
    const KEYS: &[&str] = &[
        "proposal.wait.time",
        "channelconfig.wait_time",
        "transaction_cleanup_timeout",
        "orderer.retry_wait_time",
        "orderer.waitTimeMilliSecs",
        "peer.eventRegistration.wait_time",
        "peer.retry_wait_time",
        "eventhub.reconnection_warning_rate",
        "channel.genesisblock_wait_time",
        "security_level",
        "hash_algorithm",
        "signature_algorithm",
        "proposal.consistency_validation",
        "service_discovery.frequency_sec",
    ];
    KEYS.iter()
        .filter_map(|key| {
            let env_name = format!("FABRIC_{}", screaming_snake(key));
            std::env::var(&env_name).ok().map(|v| (key.to_string(), v))
        })
        .collect()
}

fn screaming_snake(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect()
}

fn apply(config: &mut ClientConfig, values: &HashMap<String, String>) {
    if let Some(v) = values.get("proposal.wait.time").and_then(|v| v.parse().ok()) {
        config.proposal_wait_time = Duration::from_millis(v);
    }
    if let Some(v) = values.get("channelconfig.wait_time").and_then(|v| v.parse().ok()) {
        config.channelconfig_wait_time = Duration::from_millis(v);
    }
    if let Some(v) = values.get("transaction_cleanup_timeout").and_then(|v| v.parse().ok()) {
        config.transaction_cleanup_timeout = Duration::from_millis(v);
    }
    if let Some(v) = values.get("orderer.retry_wait_time").and_then(|v| v.parse().ok()) {
        config.orderer_retry_wait_time = Duration::from_millis(v);
    }
    if let Some(v) = values.get("orderer.waitTimeMilliSecs").and_then(|v| v.parse().ok()) {
        config.orderer_wait_time = Duration::from_millis(v);
    }
    if let Some(v) = values
        .get("peer.eventRegistration.wait_time")
        .and_then(|v| v.parse().ok())
    {
        config.peer_event_registration_wait_time = Duration::from_millis(v);
    }
    if let Some(v) = values.get("peer.retry_wait_time").and_then(|v| v.parse().ok()) {
        config.peer_retry_wait_time = Duration::from_millis(v);
    }
    if let Some(v) = values
        .get("eventhub.reconnection_warning_rate")
        .and_then(|v| v.parse().ok())
    {
        config.eventhub_reconnection_warning_rate = v;
    }
    if let Some(v) = values
        .get("channel.genesisblock_wait_time")
        .and_then(|v| v.parse().ok())
    {
        config.channel_genesisblock_wait_time = Duration::from_millis(v);
    }
    if let Some(v) = values.get("security_level").and_then(|v| v.parse().ok()) {
        if let Ok(level) = SecurityLevel::from_bits(v) {
            config.security_level = level;
        }
    }
    if let Some(v) = values.get("hash_algorithm") {
        if let Ok(alg) = HashAlgorithm::parse(v) {
            config.hash_algorithm = alg;
        }
    }
    if let Some(v) = values.get("signature_algorithm") {
        config.signature_algorithm = v.clone();
    }
    if let Some(v) = values
        .get("proposal.consistency_validation")
        .and_then(|v| v.parse().ok())
    {
        config.proposal_consistency_validation = v;
    }
    if let Some(v) = values
        .get("service_discovery.frequency_sec")
        .and_then(|v| v.parse().ok())
    {
        config.service_discovery_frequency_sec = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_table() {
        let config = ClientConfig::default();
        assert_eq!(config.proposal_wait_time, Duration::from_millis(30_000));
        assert_eq!(config.eventhub_reconnection_warning_rate, 50);
        assert!(config.proposal_consistency_validation);
    }

    #[test]
    fn file_values_override_defaults() {
        let mut values = HashMap::new();
        values.insert("orderer.retry_wait_time".to_string(), "750".to_string());
        let mut config = ClientConfig::default();
        apply(&mut config, &values);
        assert_eq!(config.orderer_retry_wait_time, Duration::from_millis(750));
    }
}
