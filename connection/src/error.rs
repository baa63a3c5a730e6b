use displaydoc::Display;

/// Errors raised by a peer or orderer gRPC connection.
#[derive(Debug, Display)]
pub enum ConnectionError {
    /// transport setup failed: {0}
    Transport(String),
    /// gRPC failure: {0}
    Grpc(tonic::Status),
    /// request exceeded its deadline
    Timeout,
    /// endorsement response carried no payload
    EmptyResponse,
    /// protobuf decode failure: {0}
    Decode(String),
}

impl ConnectionError {
    /// Transient failures are worth a caller retry; malformed
    /// responses and bad requests are not.
    pub fn should_retry(&self) -> bool {
        match self {
            Self::Grpc(status) => matches!(
                status.code(),
                tonic::Code::Unavailable
                    | tonic::Code::DeadlineExceeded
                    | tonic::Code::ResourceExhausted
                    | tonic::Code::Aborted
            ),
            Self::Timeout | Self::Transport(_) => true,
            Self::EmptyResponse | Self::Decode(_) => false,
        }
    }
}

impl std::error::Error for ConnectionError {}

impl From<tonic::Status> for ConnectionError {
    fn from(src: tonic::Status) -> Self {
        Self::Grpc(src)
    }
}

impl From<tonic::transport::Error> for ConnectionError {
    fn from(src: tonic::transport::Error) -> Self {
        Self::Transport(src.to_string())
    }
}

impl From<fabric_uri::UriError> for ConnectionError {
    fn from(src: fabric_uri::UriError) -> Self {
        Self::Transport(src.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConnectionError>;
