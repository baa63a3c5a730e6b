use displaydoc::Display;
use fabric_connection::ConnectionError;
use fabric_eventhub::EventHubError;
use fabric_proposal::ProposalBuildError;
use fabric_uri::UriError;

/// Errors raised by the channel orchestrator.
#[derive(Debug, Display)]
pub enum ChannelError {
    /// argument error: {0}
    Argument(String),
    /// failed to build a proposal: {0}
    Proposal(ProposalBuildError),
    /// connection failure: {0}
    Connection(ConnectionError),
    /// event hub failure: {0}
    EventHub(EventHubError),
    /// endorsement responses were inconsistent across {0} successful response(s)
    Consistency(usize),
    /// no endorsing peer returned a successful response
    NoSuccessfulEndorsement,
    /// signing identity does not chain to a trusted root of this channel's MSP
    UntrustedIdentity,
    /// orderer rejected the envelope: {0}
    Transaction(String),
    /// commit listener expired waiting for the transaction to be committed
    TransactionTimeout,
    /// the channel is shutting down
    ShuttingDown,
    /// protobuf decode failure: {0}
    Decode(String),
    /// channel (de)serialization failure: {0}
    Serialization(String),
}

impl std::error::Error for ChannelError {}

impl From<ProposalBuildError> for ChannelError {
    fn from(src: ProposalBuildError) -> Self {
        Self::Proposal(src)
    }
}

impl From<ConnectionError> for ChannelError {
    fn from(src: ConnectionError) -> Self {
        Self::Connection(src)
    }
}

impl From<EventHubError> for ChannelError {
    fn from(src: EventHubError) -> Self {
        Self::EventHub(src)
    }
}

impl From<UriError> for ChannelError {
    fn from(src: UriError) -> Self {
        Self::Serialization(src.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ChannelError>;
