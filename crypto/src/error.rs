use displaydoc::Display;

/// Errors produced by the crypto suite. None of these are retried by a
/// caller; they indicate a programming or configuration mistake rather
/// than a transient condition.
#[derive(Debug, Display)]
pub enum CryptoError {
    /// unsupported security level {0}
    UnsupportedSecurityLevel(u32),
    /// unsupported hash algorithm: {0}
    UnsupportedHashAlgorithm(String),
    /// malformed PEM input
    MalformedPem,
    /// malformed DER input: {0}
    MalformedDer(String),
    /// key and certificate do not describe the same public point
    KeyCertMismatch,
    /// signing operation failed: {0}
    SigningFailed(String),
    /// argument error: {0}
    Argument(String),
}

impl std::error::Error for CryptoError {}

pub type Result<T> = std::result::Result<T, CryptoError>;
