use displaydoc::Display;
use fabric_crypto::CryptoError;

/// Errors produced while binding a [`crate::Identity`] into a
/// [`crate::SigningContext`].
#[derive(Debug, Display)]
pub enum IdentityError {
    /// crypto failure: {0}
    Crypto(CryptoError),
    /// the private key's public point does not match the enrollment certificate's subject public key
    KeyCertMismatch,
    /// argument error: {0}
    Argument(String),
}

impl std::error::Error for IdentityError {}

impl From<CryptoError> for IdentityError {
    fn from(src: CryptoError) -> Self {
        Self::Crypto(src)
    }
}

pub type Result<T> = std::result::Result<T, IdentityError>;
