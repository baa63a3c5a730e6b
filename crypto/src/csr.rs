use crate::error::{CryptoError, Result};
use crate::keys::{KeyPair, SecurityLevel};
use rcgen::{Certificate, CertificateParams, DistinguishedName, DnType, PKCS_ECDSA_P256_SHA256, PKCS_ECDSA_P384_SHA384};

fn params_for(common_name: &str, key: &KeyPair) -> Result<CertificateParams> {
    if common_name.trim().is_empty() {
        return Err(CryptoError::Argument("commonName must not be blank".into()));
    }

    let pkcs8 = key.to_pkcs8_der()?;
    let rcgen_key = rcgen::KeyPair::from_der(&pkcs8)
        .map_err(|e| CryptoError::MalformedDer(e.to_string()))?;

    let mut params = CertificateParams::new(Vec::<String>::new());
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, common_name);
    params.distinguished_name = dn;
    params.alg = match key.security_level() {
        SecurityLevel::S256 => &PKCS_ECDSA_P256_SHA256,
        SecurityLevel::S384 => &PKCS_ECDSA_P384_SHA384,
    };
    params.key_pair = Some(rcgen_key);
    Ok(params)
}

/// Generate a PKCS#10 certificate signing request with `CN=<common_name>`,
/// signed by `key`.
pub fn generate_csr(common_name: &str, key: &KeyPair) -> Result<String> {
    let params = params_for(common_name, key)?;
    let cert = Certificate::from_params(params)
        .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
    cert.serialize_request_pem()
        .map_err(|e| CryptoError::SigningFailed(e.to_string()))
}

/// Build a throwaway self-signed certificate for the given key, used
/// only by this crate's own tests (and, via the `dev-utils` feature,
/// other crates' tests) to exercise certificate validation without a
/// live Fabric CA.
#[cfg(any(test, feature = "dev-utils"))]
#[doc(hidden)]
pub fn self_signed_cert_for_test(key: &KeyPair, common_name: &str) -> String {
    let params = params_for(common_name, key).expect("valid test params");
    let cert = Certificate::from_params(params).expect("self-signed cert");
    cert.serialize_pem().expect("serialize self-signed cert")
}

/// Build a self-signed certificate whose validity window has already
/// elapsed, for exercising expiry rejection in `crate::trust_store`'s
/// tests.
#[cfg(test)]
pub(crate) fn expired_self_signed_cert_for_test(key: &KeyPair, common_name: &str) -> String {
    let mut params = params_for(common_name, key).expect("valid test params");
    params.not_before = rcgen::date_time_ymd(2000, 1, 1);
    params.not_after = rcgen::date_time_ymd(2001, 1, 1);
    let cert = Certificate::from_params(params).expect("self-signed cert");
    cert.serialize_pem().expect("serialize self-signed cert")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suite::{CryptoSuite, CryptoSuiteOptions};

    #[test]
    fn generate_csr_embeds_common_name() {
        let suite = CryptoSuite::new(CryptoSuiteOptions::default());
        let key = suite.key_gen();
        let csr_pem = generate_csr("test-user", &key).unwrap();
        assert!(csr_pem.starts_with("-----BEGIN CERTIFICATE REQUEST-----"));
    }

    #[test]
    fn generate_csr_rejects_blank_common_name() {
        let suite = CryptoSuite::new(CryptoSuiteOptions::default());
        let key = suite.key_gen();
        assert!(generate_csr("  ", &key).is_err());
    }
}
