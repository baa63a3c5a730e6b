use displaydoc::Display;
use fabric_channel::ChannelError;
use fabric_connection::ConnectionError;
use fabric_crypto::CryptoError;
use fabric_eventhub::EventHubError;
use fabric_identity::IdentityError;
use fabric_proposal::ProposalBuildError;
use fabric_uri::UriError;

/// The facade's unified error type: every per-crate error converts
/// into this via `From`, so callers of [`crate::HFClient`] only ever
/// handle one enum.
#[derive(Debug, Display)]
pub enum FabricError {
    /// crypto failure: {0}
    Crypto(CryptoError),
    /// identity failure: {0}
    Identity(IdentityError),
    /// URI failure: {0}
    Uri(UriError),
    /// proposal build failure: {0}
    Proposal(ProposalBuildError),
    /// connection failure: {0}
    Connection(ConnectionError),
    /// event hub failure: {0}
    EventHub(EventHubError),
    /// channel failure: {0}
    Channel(ChannelError),
    /// configuration error: {0}
    Config(String),
    /// unknown channel: {0}
    UnknownChannel(String),
    /// a channel named {0} is already registered
    DuplicateChannel(String),
}

impl std::error::Error for FabricError {}

impl From<CryptoError> for FabricError {
    fn from(src: CryptoError) -> Self {
        Self::Crypto(src)
    }
}

impl From<IdentityError> for FabricError {
    fn from(src: IdentityError) -> Self {
        Self::Identity(src)
    }
}

impl From<UriError> for FabricError {
    fn from(src: UriError) -> Self {
        Self::Uri(src)
    }
}

impl From<ProposalBuildError> for FabricError {
    fn from(src: ProposalBuildError) -> Self {
        Self::Proposal(src)
    }
}

impl From<ConnectionError> for FabricError {
    fn from(src: ConnectionError) -> Self {
        Self::Connection(src)
    }
}

impl From<EventHubError> for FabricError {
    fn from(src: EventHubError) -> Self {
        Self::EventHub(src)
    }
}

impl From<ChannelError> for FabricError {
    fn from(src: ChannelError) -> Self {
        Self::Channel(src)
    }
}

pub type Result<T> = std::result::Result<T, FabricError>;
