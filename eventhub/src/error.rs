use displaydoc::Display;
use fabric_connection::ConnectionError;

/// Errors raised by an event hub's own operations (registration,
/// block decoding); transport/reconnection failures are handled
/// internally and never surfaced to callers.
#[derive(Debug, Display)]
pub enum EventHubError {
    /// connection failure: {0}
    Connection(ConnectionError),
    /// register-ack was not received within the configured deadline
    RegistrationTimeout,
    /// received a block that could not be decoded: {0}
    MalformedBlock(String),
    /// the event hub is shutting down
    ShuttingDown,
}

impl std::error::Error for EventHubError {}

impl From<ConnectionError> for EventHubError {
    fn from(src: ConnectionError) -> Self {
        Self::Connection(src)
    }
}

impl From<tonic::Status> for EventHubError {
    fn from(src: tonic::Status) -> Self {
        Self::Connection(ConnectionError::from(src))
    }
}

pub type Result<T> = std::result::Result<T, EventHubError>;
