use displaydoc::Display;

/// Errors raised while assembling a proposal.
#[derive(Debug, Display)]
pub enum ProposalBuildError {
    /// unsupported chaincode type: {0}
    UnsupportedChaincodeType(String),
    /// argument error: {0}
    Argument(String),
    /// failed to package chaincode source: {0}
    Packaging(String),
    /// failed to encode protobuf payload: {0}
    Encoding(String),
}

impl std::error::Error for ProposalBuildError {}

pub type Result<T> = std::result::Result<T, ProposalBuildError>;
