use crate::endpoint::pem_to_der;
use crate::error::{Result, UriError};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::RwLock;
use x509_cert::der::Decode;
use x509_cert::Certificate;

/// A concurrent, read-mostly cache of the CN extracted from a root-CA
/// PEM blob, keyed by the PEM text itself.
static CN_CACHE: Lazy<RwLock<HashMap<String, String>>> = Lazy::new(|| RwLock::new(HashMap::new()));

/// Extract the CN of the first certificate in `root_certs_pem`,
/// memoized in [`CN_CACHE`]. Used when the caller set
/// `trustServerCertificate=true` without an explicit hostname override.
pub fn common_name_for(root_certs_pem: &str) -> Result<String> {
    if let Some(cn) = CN_CACHE.read().expect("cn cache lock poisoned").get(root_certs_pem) {
        return Ok(cn.clone());
    }

    let der = pem_to_der(root_certs_pem)?;
    let cert = Certificate::from_der(&der).map_err(|_| UriError::NoCommonName)?;
    let cn = cert
        .tbs_certificate
        .subject
        .0
        .iter()
        .flat_map(|rdn| rdn.0.iter())
        .find_map(|atv| {
            // CommonName OID is 2.5.4.3.
            if atv.oid.to_string() == "2.5.4.3" {
                std::str::from_utf8(atv.value.value()).ok().map(str::to_string)
            } else {
                None
            }
        })
        .ok_or(UriError::NoCommonName)?;

    CN_CACHE
        .write()
        .expect("cn cache lock poisoned")
        .insert(root_certs_pem.to_string(), cn.clone());
    Ok(cn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_garbage_pem() {
        assert!(common_name_for("not a cert").is_err());
    }
}
