use crate::error::{CryptoError, Result};
use p256::ecdsa::SigningKey as P256SigningKey;
use p384::ecdsa::SigningKey as P384SigningKey;
use signature::Signer;
use zeroize::ZeroizeOnDrop;

/// EC security level, mirrored onto a concrete NIST curve.
///
/// `256` maps to P-256, `384` to P-384; any other value is an argument
/// error.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SecurityLevel {
    S256,
    S384,
}

impl SecurityLevel {
    pub fn from_bits(bits: u32) -> Result<Self> {
        match bits {
            256 => Ok(Self::S256),
            384 => Ok(Self::S384),
            other => Err(CryptoError::UnsupportedSecurityLevel(other)),
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            Self::S256 => 256,
            Self::S384 => 384,
        }
    }
}

/// An asymmetric EC key pair, curve chosen by [`SecurityLevel`].
///
/// Private key material is zeroized on drop; the enum itself never
/// exposes raw scalar bytes, only DER/PEM encodings and signing
/// operations.
#[derive(Clone, ZeroizeOnDrop)]
pub enum KeyPair {
    #[zeroize(skip)] // SigningKey zeroizes itself
    P256(P256SigningKey),
    #[zeroize(skip)]
    P384(P384SigningKey),
}

impl KeyPair {
    pub fn generate(level: SecurityLevel, rng: &mut (impl rand_core::CryptoRng + rand_core::RngCore)) -> Self {
        match level {
            SecurityLevel::S256 => Self::P256(P256SigningKey::random(rng)),
            SecurityLevel::S384 => Self::P384(P384SigningKey::random(rng)),
        }
    }

    pub fn security_level(&self) -> SecurityLevel {
        match self {
            Self::P256(_) => SecurityLevel::S256,
            Self::P384(_) => SecurityLevel::S384,
        }
    }

    /// Load a private key from PEM text, trying PKCS#8 first and
    /// falling back to SEC1 ("EC PRIVATE KEY") encoding, as produced by
    /// most CA tooling Fabric users carry over from OpenSSL.
    pub fn from_pem(level: SecurityLevel, pem_str: &str) -> Result<Self> {
        let parsed = pem::parse(pem_str).map_err(|_| CryptoError::MalformedPem)?;
        match level {
            SecurityLevel::S256 => {
                use p256::pkcs8::DecodePrivateKey;
                use p256::SecretKey;
                let secret = SecretKey::from_pkcs8_der(parsed.contents())
                    .or_else(|_| SecretKey::from_sec1_der(parsed.contents()))
                    .map_err(|e| CryptoError::MalformedDer(e.to_string()))?;
                Ok(Self::P256(P256SigningKey::from(secret)))
            }
            SecurityLevel::S384 => {
                use p384::pkcs8::DecodePrivateKey;
                use p384::SecretKey;
                let secret = SecretKey::from_pkcs8_der(parsed.contents())
                    .or_else(|_| SecretKey::from_sec1_der(parsed.contents()))
                    .map_err(|e| CryptoError::MalformedDer(e.to_string()))?;
                Ok(Self::P384(P384SigningKey::from(secret)))
            }
        }
    }

    /// Export the private key as PKCS#8 DER bytes.
    pub fn to_pkcs8_der(&self) -> Result<Vec<u8>> {
        match self {
            Self::P256(sk) => {
                use p256::pkcs8::EncodePrivateKey;
                sk.to_pkcs8_der()
                    .map(|doc| doc.as_bytes().to_vec())
                    .map_err(|e| CryptoError::MalformedDer(e.to_string()))
            }
            Self::P384(sk) => {
                use p384::pkcs8::EncodePrivateKey;
                sk.to_pkcs8_der()
                    .map(|doc| doc.as_bytes().to_vec())
                    .map_err(|e| CryptoError::MalformedDer(e.to_string()))
            }
        }
    }

    /// The SEC1 encoded public point, uncompressed form.
    pub fn public_point(&self) -> Vec<u8> {
        match self {
            Self::P256(sk) => sk.verifying_key().to_encoded_point(false).as_bytes().to_vec(),
            Self::P384(sk) => sk.verifying_key().to_encoded_point(false).as_bytes().to_vec(),
        }
    }

    /// Sign `data`, returning a DER-encoded ECDSA signature with the
    /// canonical low-S form Fabric requires.
    pub fn sign(&self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::P256(sk) => {
                let sig: p256::ecdsa::Signature = sk.sign(data);
                let sig = sig.normalize_s().unwrap_or(sig);
                sig.to_der().as_bytes().to_vec()
            }
            Self::P384(sk) => {
                let sig: p384::ecdsa::Signature = sk.sign(data);
                let sig = sig.normalize_s().unwrap_or(sig);
                sig.to_der().as_bytes().to_vec()
            }
        }
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeyPair({:?}, <redacted>)", self.security_level().bits())
    }
}
