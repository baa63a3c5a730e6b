use crate::error::{CryptoError, Result};
use crate::suite::parse_cert_pem;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::SystemTime;
use x509_cert::der::{DateTime, Encode};
use x509_cert::Certificate;

/// Identifies a certificate by subject + serial, for idempotent
/// trust-store inserts.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
struct CertKey {
    subject: String,
    serial_hex: String,
}

fn cert_key(cert: &Certificate) -> CertKey {
    CertKey {
        subject: cert.tbs_certificate.subject.to_string(),
        serial_hex: hex::encode(cert.tbs_certificate.serial_number.as_bytes()),
    }
}

/// A set of trusted X.509 certificates plus a chain-validation
/// procedure. Validation returns a boolean, never an error.
#[derive(Default)]
pub struct TrustStore {
    anchors: RwLock<HashMap<CertKey, Certificate>>,
}

impl TrustStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a trust anchor from PEM text. Rejects null/blank input;
    /// duplicate subject+serial pairs silently overwrite the existing
    /// entry (idempotent).
    pub fn add_cert_pem(&self, pem_str: &str) -> Result<()> {
        if pem_str.trim().is_empty() {
            return Err(CryptoError::Argument("certificate PEM is blank".into()));
        }
        let cert = parse_cert_pem(pem_str)?;
        let key = cert_key(&cert);
        self.anchors
            .write()
            .expect("trust store lock poisoned")
            .insert(key, cert);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.anchors.read().expect("trust store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true iff `cert_pem` chain-builds to a registered anchor
    /// and has not expired. Never panics or errors on malformed input;
    /// malformed certificates simply fail to validate.
    pub fn validate(&self, cert_pem: &str) -> bool {
        let cert = match parse_cert_pem(cert_pem) {
            Ok(c) => c,
            Err(_) => return false,
        };
        self.validate_cert(&cert)
    }

    fn validate_cert(&self, cert: &Certificate) -> bool {
        let anchors = self.anchors.read().expect("trust store lock poisoned");

        // Directly trusted (the cert itself is an anchor).
        if anchors.contains_key(&cert_key(cert)) {
            return self.is_time_valid(cert);
        }

        // Single-hop chain: issuer subject matches an anchor's subject
        // and the anchor's key verifies the signature. Fabric MSP
        // trust stores are shallow (root or intermediate + leaf), so a
        // one-hop walk covers the cases this client needs to decide.
        let issuer = cert.tbs_certificate.issuer.to_string();
        for anchor in anchors.values() {
            if anchor.tbs_certificate.subject.to_string() == issuer
                && verify_issued_by(cert, anchor)
            {
                return self.is_time_valid(cert) && self.is_time_valid(anchor);
            }
        }
        false
    }

    /// Wall-clock check against the certificate's `notBefore`/`notAfter`
    ///. A validity window
    /// that doesn't even convert to a `DateTime` is itself a rejection.
    fn is_time_valid(&self, cert: &Certificate) -> bool {
        let Ok(now) = DateTime::try_from(SystemTime::now()) else {
            return false;
        };
        let validity = &cert.tbs_certificate.validity;
        let not_before = validity.not_before.to_date_time();
        let not_after = validity.not_after.to_date_time();
        now >= not_before && now <= not_after
    }
}

fn verify_issued_by(leaf: &Certificate, issuer: &Certificate) -> bool {
    use p256::ecdsa::signature::Verifier;
    let Some(spki_bytes) = issuer
        .tbs_certificate
        .subject_public_key_info
        .subject_public_key
        .as_bytes()
    else {
        return false;
    };
    let Ok(verifying_key) = p256::ecdsa::VerifyingKey::from_sec1_bytes(spki_bytes) else {
        return false;
    };
    let Some(sig_bytes) = leaf.signature.as_bytes() else {
        return false;
    };
    let Ok(sig) = p256::ecdsa::Signature::from_der(sig_bytes) else {
        return false;
    };
    let Ok(tbs_der) = leaf.tbs_certificate.to_der() else {
        return false;
    };
    verifying_key.verify(&tbs_der, &sig).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csr::self_signed_cert_for_test;
    use crate::keys::SecurityLevel;
    use crate::suite::{CryptoSuite, CryptoSuiteOptions};

    #[test]
    fn add_cert_rejects_blank() {
        let store = TrustStore::new();
        assert!(store.add_cert_pem("").is_err());
        assert!(store.add_cert_pem("   ").is_err());
    }

    #[test]
    fn add_cert_is_idempotent() {
        let suite = CryptoSuite::new(CryptoSuiteOptions::default());
        let key = suite.key_gen();
        let cert_pem = self_signed_cert_for_test(&key, "root");

        let store = TrustStore::new();
        store.add_cert_pem(&cert_pem).unwrap();
        store.add_cert_pem(&cert_pem).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn validate_accepts_directly_trusted_cert() {
        let suite = CryptoSuite::new(CryptoSuiteOptions::default());
        let key = suite.key_gen();
        let cert_pem = self_signed_cert_for_test(&key, "root");

        let store = TrustStore::new();
        store.add_cert_pem(&cert_pem).unwrap();
        assert!(store.validate(&cert_pem));
    }

    #[test]
    fn validate_rejects_untrusted_cert() {
        let suite = CryptoSuite::new(CryptoSuiteOptions::default());
        let key = suite.key_gen();
        let cert_pem = self_signed_cert_for_test(&key, "root");

        let other_key = suite.key_gen();
        let other_cert = self_signed_cert_for_test(&other_key, "other");

        let store = TrustStore::new();
        store.add_cert_pem(&cert_pem).unwrap();
        assert!(!store.validate(&other_cert));
    }

    #[test]
    fn validate_rejects_malformed_input_without_panic() {
        let store = TrustStore::new();
        assert!(!store.validate("not a certificate"));
    }

    #[test]
    fn validate_rejects_an_expired_cert_even_if_directly_trusted() {
        let suite = CryptoSuite::new(CryptoSuiteOptions::default());
        let key = suite.key_gen();
        let cert_pem = crate::csr::expired_self_signed_cert_for_test(&key, "root");

        let store = TrustStore::new();
        store.add_cert_pem(&cert_pem).unwrap();
        assert!(!store.validate(&cert_pem));
    }

    #[test]
    fn security_level_round_trips_through_bits() {
        assert_eq!(SecurityLevel::from_bits(256).unwrap().bits(), 256);
        assert_eq!(SecurityLevel::from_bits(384).unwrap().bits(), 384);
        assert!(SecurityLevel::from_bits(128).is_err());
    }
}
