use crate::error::{ConnectionError, Result};
use fabric_uri::{Credentials, GrpcOption};
use std::time::Duration;
use tonic::transport::{Certificate, Channel, ClientTlsConfig, Endpoint as TonicEndpoint, Identity};

/// Build a lazily-connecting [`tonic::transport::Channel`] from a
/// parsed [`fabric_uri::Endpoint`], applying its TLS credentials and
/// `grpc.<option>` channel options.
pub fn build_channel(endpoint: &fabric_uri::Endpoint) -> Result<Channel> {
    let scheme = if endpoint.protocol().is_tls() { "https" } else { "http" };
    let uri = format!("{}://{}:{}", scheme, endpoint.host(), endpoint.port());
    let mut builder = TonicEndpoint::from_shared(uri)?;

    if let Credentials::Tls {
        root_certs_pem,
        client_pair,
        hostname_override,
        trust_server_certificate,
    } = endpoint.credentials()
    {
        let mut tls = ClientTlsConfig::new();
        if let Some(root) = root_certs_pem {
            tls = tls.ca_certificate(Certificate::from_pem(root));
        }
        if let Some(pair) = client_pair {
            tls = tls.identity(Identity::from_pem(&pair.cert_pem, &pair.key_pem));
        }
        if let Some(name) = hostname_override {
            tls = tls.domain_name(name.clone());
        } else if *trust_server_certificate {
            // No override and the caller has opted not to pin the
            // presented name against the root's own subject — fall
            // back to the connection host rather than looking up a CN
            // that may not even match what's being dialed: an escape
            // hatch for dev networks.
            tls = tls.domain_name(endpoint.host().to_string());
        } else if let Some(root) = root_certs_pem {
            let cn = fabric_uri::common_name_for(root).unwrap_or_else(|_| endpoint.host().to_string());
            tls = tls.domain_name(cn);
        } else {
            tls = tls.domain_name(endpoint.host().to_string());
        }
        builder = builder
            .tls_config(tls)
            .map_err(|e| ConnectionError::Transport(e.to_string()))?;
    }

    for (key, value) in endpoint.options() {
        builder = apply_option(builder, key, value);
    }

    Ok(builder.connect_lazy())
}

/// Reads back `grpc.max_receive_message_length`, applied per-stub by
/// the peer/orderer client constructors rather than on the channel.
pub fn max_receive_message_length(endpoint: &fabric_uri::Endpoint) -> Option<usize> {
    match endpoint.options().get("grpc.max_receive_message_length") {
        Some(GrpcOption::Int(bytes)) if *bytes >= 0 => Some(*bytes as usize),
        _ => None,
    }
}

fn apply_option(builder: TonicEndpoint, key: &str, value: &GrpcOption) -> TonicEndpoint {
    match (key, value) {
        ("grpc.keepalive_time_ms", GrpcOption::Int(ms)) => {
            builder.http2_keep_alive_interval(Duration::from_millis((*ms).max(0) as u64))
        }
        ("grpc.keepalive_timeout_ms", GrpcOption::Int(ms)) => {
            builder.keep_alive_timeout(Duration::from_millis((*ms).max(0) as u64))
        }
        ("grpc.max_receive_message_length", GrpcOption::Int(bytes)) => {
            // Message-size limits are applied per client stub in tonic;
            // the value is kept on the endpoint's options map for the
            // client constructors in this crate to read back.
            let _ = bytes;
            builder
        }
        ("grpc.http2.max_pings_without_data", _) | (_, _) => builder,
    }
}
