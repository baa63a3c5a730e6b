use crate::error::{IdentityError, Result};
use crate::identity::Identity;
use fabric_crypto::CryptoSuite;
use fabric_protos::msp::SerializedIdentity;
use prost::Message;
use x509_cert::der::Decode;
use x509_cert::Certificate;

/// Binds an [`Identity`] to a [`CryptoSuite`], validating the
/// key/certificate invariant once, and offers the signing operations
/// the rest of the client needs to build headers and proposals.
/// Immutable after construction.
#[derive(Clone)]
pub struct SigningContext {
    identity: Identity,
    serialized_identity: Vec<u8>,
}

impl SigningContext {
    /// Bind `identity` after checking that its private key's public
    /// point matches the enrollment certificate's subject public key.
    pub fn bind(identity: Identity, _crypto_suite: &CryptoSuite) -> Result<Self> {
        let der = pem::parse(&identity.enrollment.cert_pem)
            .map_err(|e| IdentityError::Argument(e.to_string()))?;
        let cert = Certificate::from_der(der.contents())
            .map_err(|e| IdentityError::Argument(e.to_string()))?;
        let spki_bytes = cert
            .tbs_certificate
            .subject_public_key_info
            .subject_public_key
            .as_bytes()
            .ok_or_else(|| IdentityError::Argument("certificate SPKI is not byte-aligned".into()))?;

        if spki_bytes != identity.enrollment.key.public_point() {
            return Err(IdentityError::KeyCertMismatch);
        }

        let serialized_identity = SerializedIdentity {
            mspid: identity.msp_id.clone(),
            id_bytes: identity.enrollment.cert_pem.as_bytes().to_vec(),
        }
        .encode_to_vec();

        Ok(Self {
            identity,
            serialized_identity,
        })
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// The serialized `SerializedIdentity` bytes used as the
    /// `creator` field of a proposal/transaction SignatureHeader.
    pub fn serialized_identity(&self) -> &[u8] {
        &self.serialized_identity
    }

    /// Sign `bytes` with the bound identity's private key, returning a
    /// DER-encoded, low-S ECDSA signature.
    pub fn sign(&self, crypto_suite: &CryptoSuite, bytes: &[u8]) -> Vec<u8> {
        crypto_suite.sign(&self.identity.enrollment.key, bytes)
    }
}
