use displaydoc::Display;

/// Errors from URL parsing and endpoint/credential construction. All
/// variants are argument errors: never retried by a caller.
#[derive(Debug, Display, Clone, Eq, PartialEq)]
pub enum UriError {
    /// `{0}` does not match `(grpc|grpcs)://host:port`
    InvalidUrl(String),
    /// mutual TLS requires both a client key and certificate, got only one
    AsymmetricTlsMaterial,
    /// could not extract a CN from the supplied root certificate PEM
    NoCommonName,
    /// malformed PEM: {0}
    MalformedPem(String),
    /// unknown grpc.* option value for `{0}`
    InvalidOption(String),
}

impl std::error::Error for UriError {}

pub type Result<T> = std::result::Result<T, UriError>;
