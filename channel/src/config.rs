use std::time::Duration;

/// Per-channel tunables.
#[derive(Clone, Debug)]
pub struct ChannelOptions {
    pub proposal_wait_time: Duration,
    pub channelconfig_wait_time: Duration,
    pub transaction_cleanup_timeout: Duration,
    pub orderer_retry_wait_time: Duration,
    pub orderer_wait_time: Duration,
    pub orderer_broadcast_attempts: usize,
    pub proposal_consistency_validation: bool,
    pub service_discovery_freq_seconds: Option<u64>,
}

impl Default for ChannelOptions {
    fn default() -> Self {
        Self {
            proposal_wait_time: Duration::from_millis(30_000),
            channelconfig_wait_time: Duration::from_millis(15_000),
            transaction_cleanup_timeout: Duration::from_millis(600_000),
            orderer_retry_wait_time: Duration::from_millis(200),
            orderer_wait_time: Duration::from_millis(10_000),
            orderer_broadcast_attempts: 5,
            proposal_consistency_validation: true,
            service_discovery_freq_seconds: Some(120),
        }
    }
}
