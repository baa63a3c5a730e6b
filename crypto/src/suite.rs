use crate::error::{CryptoError, Result};
use crate::keys::{KeyPair, SecurityLevel};
use sha2::{Digest as Sha2Digest, Sha256, Sha384};
use sha3::{Sha3_256, Sha3_384};
use signature::Verifier;
use x509_cert::der::{Decode, DecodePem};
use x509_cert::Certificate;

/// The hash family a suite uses, independent of digest width (the
/// width is derived from the paired [`SecurityLevel`]).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum HashAlgorithm {
    Sha2,
    Sha3,
}

impl HashAlgorithm {
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "SHA2" => Ok(Self::Sha2),
            "SHA3" => Ok(Self::Sha3),
            other => Err(CryptoError::UnsupportedHashAlgorithm(other.to_string())),
        }
    }
}

/// The enumerated option set. Two suites built from equal options are
/// interchangeable.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct CryptoSuiteOptions {
    pub security_level: SecurityLevel,
    pub hash_algorithm: HashAlgorithm,
}

impl Default for CryptoSuiteOptions {
    fn default() -> Self {
        Self {
            security_level: SecurityLevel::S256,
            hash_algorithm: HashAlgorithm::Sha2,
        }
    }
}

/// Process-wide cryptographic operations: key generation, signing,
/// verification, and hashing. Thread-safe and immutable after
/// construction; key material is immutable too.
#[derive(Clone, Debug)]
pub struct CryptoSuite {
    options: CryptoSuiteOptions,
}

impl CryptoSuite {
    pub fn new(options: CryptoSuiteOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CryptoSuiteOptions {
        &self.options
    }

    /// Generate a new key pair on the suite's configured curve.
    pub fn key_gen(&self) -> KeyPair {
        let mut rng = rand_core::OsRng;
        KeyPair::generate(self.options.security_level, &mut rng)
    }

    /// Sign `data` with `key`, returning a DER-encoded, low-S ECDSA
    /// signature.
    pub fn sign(&self, key: &KeyPair, data: &[u8]) -> Vec<u8> {
        key.sign(data)
    }

    /// Verify a DER-encoded signature over `data` against the public
    /// key carried by `cert_pem`. Returns `Ok(false)` (never an error)
    /// for a cryptographic mismatch; only malformed input is an error.
    pub fn verify(&self, cert_pem: &str, signature_der: &[u8], data: &[u8]) -> Result<bool> {
        let cert = parse_cert_pem(cert_pem)?;
        let spki = &cert.tbs_certificate.subject_public_key_info;
        let point = spki.subject_public_key.as_bytes().ok_or_else(|| {
            CryptoError::MalformedDer("subject public key is not byte-aligned".into())
        })?;

        match self.options.security_level {
            SecurityLevel::S256 => {
                let verifying_key = p256::ecdsa::VerifyingKey::from_sec1_bytes(point)
                    .map_err(|e| CryptoError::MalformedDer(e.to_string()))?;
                let sig = p256::ecdsa::Signature::from_der(signature_der)
                    .map_err(|e| CryptoError::MalformedDer(e.to_string()))?;
                Ok(verifying_key.verify(data, &sig).is_ok())
            }
            SecurityLevel::S384 => {
                let verifying_key = p384::ecdsa::VerifyingKey::from_sec1_bytes(point)
                    .map_err(|e| CryptoError::MalformedDer(e.to_string()))?;
                let sig = p384::ecdsa::Signature::from_der(signature_der)
                    .map_err(|e| CryptoError::MalformedDer(e.to_string()))?;
                Ok(verifying_key.verify(data, &sig).is_ok())
            }
        }
    }

    /// Hash `bytes` with the digest family/width selected by the
    /// suite's options.
    pub fn hash(&self, bytes: &[u8]) -> Vec<u8> {
        match (self.options.hash_algorithm, self.options.security_level) {
            (HashAlgorithm::Sha2, SecurityLevel::S256) => Sha256::digest(bytes).to_vec(),
            (HashAlgorithm::Sha2, SecurityLevel::S384) => Sha384::digest(bytes).to_vec(),
            (HashAlgorithm::Sha3, SecurityLevel::S256) => Sha3_256::digest(bytes).to_vec(),
            (HashAlgorithm::Sha3, SecurityLevel::S384) => Sha3_384::digest(bytes).to_vec(),
        }
    }
}

pub(crate) fn parse_cert_pem(pem_str: &str) -> Result<Certificate> {
    if pem_str.trim().is_empty() {
        return Err(CryptoError::Argument("certificate PEM is blank".into()));
    }
    Certificate::from_pem(pem_str.as_bytes()).or_else(|_| {
        // Some callers hand us raw DER; tolerate that too.
        Certificate::from_der(pem_str.as_bytes()).map_err(|_| CryptoError::MalformedPem)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_algorithm_parse_rejects_unknown() {
        assert!(HashAlgorithm::parse("MD5").is_err());
        assert!(HashAlgorithm::parse("SHA2").is_ok());
        assert!(HashAlgorithm::parse("SHA3").is_ok());
    }

    #[test]
    fn sign_then_verify_against_self_signed_cert_round_trips() {
        let suite = CryptoSuite::new(CryptoSuiteOptions::default());
        let key = suite.key_gen();
        let cert_pem = crate::csr::self_signed_cert_for_test(&key, "unit-test");
        let sig = suite.sign(&key, b"hello fabric");
        assert!(suite.verify(&cert_pem, &sig, b"hello fabric").unwrap());
        assert!(!suite.verify(&cert_pem, &sig, b"tampered").unwrap());
    }

    #[test]
    fn low_s_signatures_are_normalized() {
        let suite = CryptoSuite::new(CryptoSuiteOptions::default());
        let key = suite.key_gen();
        for msg in [b"a".as_slice(), b"bb".as_slice(), b"ccc".as_slice()] {
            let der = suite.sign(&key, msg);
            let sig = p256::ecdsa::Signature::from_der(&der).unwrap();
            assert!(sig.normalize_s().is_none(), "signature should already be low-S");
        }
    }
}
