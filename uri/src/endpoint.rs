use crate::error::{Result, UriError};
use std::collections::BTreeMap;

/// Transport protocol, parsed from the URL scheme.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Protocol {
    Grpc,
    Grpcs,
}

impl Protocol {
    pub fn is_tls(self) -> bool {
        matches!(self, Self::Grpcs)
    }
}

/// A `grpc.<option>` channel option; integers are used when the value
/// parses as one, otherwise the raw string is kept.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum GrpcOption {
    Int(i64),
    Str(String),
}

impl From<&str> for GrpcOption {
    fn from(value: &str) -> Self {
        match value.parse::<i64>() {
            Ok(n) => GrpcOption::Int(n),
            Err(_) => GrpcOption::Str(value.to_string()),
        }
    }
}

/// TLS client key material, required to be symmetric: if either piece
/// is present, both must be.
#[derive(Clone, Debug)]
pub struct ClientKeyPair {
    pub cert_pem: String,
    pub key_pem: String,
}

/// Transport credentials for an [`Endpoint`].
#[derive(Clone, Debug, Default)]
pub enum Credentials {
    #[default]
    None,
    Tls {
        root_certs_pem: Option<String>,
        client_pair: Option<ClientKeyPair>,
        trust_server_certificate: bool,
        hostname_override: Option<String>,
    },
}

/// A parsed `grpc(s)://host:port` target plus its transport
/// credentials and channel options. Created once per
/// remote and reused across channels.
#[derive(Clone, Debug)]
pub struct Endpoint {
    url: String,
    protocol: Protocol,
    host: String,
    port: u16,
    credentials: Credentials,
    options: BTreeMap<String, GrpcOption>,
}

impl Endpoint {
    /// Parse `grpc://host:port` or `grpcs://host:port`. Anything else
    /// is an [`UriError::InvalidUrl`].
    pub fn parse(url: &str) -> Result<Self> {
        let parsed =
            url::Url::parse(url).map_err(|_| UriError::InvalidUrl(url.to_string()))?;

        let protocol = match parsed.scheme().to_ascii_lowercase().as_str() {
            "grpc" => Protocol::Grpc,
            "grpcs" => Protocol::Grpcs,
            _ => return Err(UriError::InvalidUrl(url.to_string())),
        };

        let host = parsed
            .host_str()
            .ok_or_else(|| UriError::InvalidUrl(url.to_string()))?
            .to_string();
        let port = parsed
            .port()
            .ok_or_else(|| UriError::InvalidUrl(url.to_string()))?;

        if host.is_empty() || parsed.path() != "" && parsed.path() != "/" {
            return Err(UriError::InvalidUrl(url.to_string()));
        }

        Ok(Self {
            url: url.to_string(),
            protocol,
            host,
            port,
            credentials: Credentials::None,
            options: BTreeMap::new(),
        })
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Result<Self> {
        if let Credentials::Tls {
            client_pair: Some(_),
            ..
        } = &credentials
        {
            // symmetry is enforced by ClientKeyPair's two required
            // fields, nothing further to validate here; asymmetric
            // *sourcing* (e.g. "cert from file, key from thumbprint")
            // is validated by the caller-facing builder below.
        }
        self.credentials = credentials;
        Ok(self)
    }

    /// Build TLS credentials from optional (key, cert) sources,
    /// rejecting the case where exactly one is present.
    pub fn tls_credentials(
        root_certs_pem: Option<String>,
        client_key_pem: Option<String>,
        client_cert_pem: Option<String>,
        trust_server_certificate: bool,
        hostname_override: Option<String>,
    ) -> Result<Credentials> {
        let client_pair = match (client_key_pem, client_cert_pem) {
            (Some(key_pem), Some(cert_pem)) => Some(ClientKeyPair { key_pem, cert_pem }),
            (None, None) => None,
            _ => return Err(UriError::AsymmetricTlsMaterial),
        };
        Ok(Credentials::Tls {
            root_certs_pem,
            client_pair,
            trust_server_certificate,
            hostname_override,
        })
    }

    /// Record a `grpc.<key>` transport channel option.
    pub fn set_option(&mut self, key: impl Into<String>, value: &str) {
        self.options.insert(key.into(), GrpcOption::from(value));
    }

    pub fn options(&self) -> &BTreeMap<String, GrpcOption> {
        &self.options
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// The TLS client certificate digest (SHA-256 over DER) used for
    /// Fabric's tls-binding, computed eagerly so it can be treated as
    /// immutable thereafter.
    pub fn tls_client_cert_digest(&self) -> Option<[u8; 32]> {
        if let Credentials::Tls {
            client_pair: Some(pair),
            ..
        } = &self.credentials
        {
            use sha2::{Digest, Sha256};
            let der = pem_to_der(&pair.cert_pem).ok()?;
            Some(Sha256::digest(der).into())
        } else {
            None
        }
    }
}

pub(crate) fn pem_to_der(pem_str: &str) -> Result<Vec<u8>> {
    pem::parse(pem_str)
        .map(|p| p.contents().to_vec())
        .map_err(|e| UriError::MalformedPem(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_grpc_url() {
        let ep = Endpoint::parse("grpc://peer0.org1.example.com:7051").unwrap();
        assert_eq!(ep.protocol(), Protocol::Grpc);
        assert_eq!(ep.host(), "peer0.org1.example.com");
        assert_eq!(ep.port(), 7051);
    }

    #[test]
    fn parses_grpcs_url_case_insensitive_scheme() {
        let ep = Endpoint::parse("GRPCS://h:65535").unwrap();
        assert_eq!(ep.protocol(), Protocol::Grpcs);
        assert_eq!(ep.port(), 65535);
    }

    #[test]
    fn rejects_other_schemes() {
        assert!(Endpoint::parse("http://x:1").is_err());
    }

    #[test]
    fn rejects_missing_port() {
        assert!(Endpoint::parse("grpcs://h:abc").is_err());
        assert!(Endpoint::parse("grpc://host-with-no-port").is_err());
    }

    #[test]
    fn tls_credentials_rejects_asymmetric_material() {
        let err = Endpoint::tls_credentials(
            None,
            Some("key".to_string()),
            None,
            false,
            None,
        )
        .unwrap_err();
        assert_eq!(err, UriError::AsymmetricTlsMaterial);
    }

    #[test]
    fn tls_credentials_accepts_symmetric_material() {
        let creds = Endpoint::tls_credentials(
            Some("root".to_string()),
            Some("key".to_string()),
            Some("cert".to_string()),
            true,
            None,
        )
        .unwrap();
        assert!(matches!(creds, Credentials::Tls { .. }));
    }

    #[test]
    fn grpc_option_parses_integers() {
        assert_eq!(GrpcOption::from("30000"), GrpcOption::Int(30000));
        assert_eq!(
            GrpcOption::from("some-string"),
            GrpcOption::Str("some-string".to_string())
        );
    }
}
