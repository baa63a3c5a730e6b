use crate::endpoint::Endpoint;
use std::fmt;

/// Common behavior shared by every flavor of remote URI the client
/// talks to (endorsing peer, orderer): a generic URI core plus
/// per-remote-kind newtypes.
pub trait ConnectionUri: fmt::Display + Clone {
    fn endpoint(&self) -> &Endpoint;

    fn host(&self) -> &str {
        self.endpoint().host()
    }

    fn port(&self) -> u16 {
        self.endpoint().port()
    }

    fn addr(&self) -> String {
        self.endpoint().addr()
    }

    /// Basic-auth username, if this remote authenticates that way.
    /// Fabric gRPC services typically rely on mTLS/MSP identity
    /// instead, so this defaults to empty.
    fn username(&self) -> &str {
        ""
    }

    fn password(&self) -> &str {
        ""
    }
}

macro_rules! uri_newtype {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Debug)]
        pub struct $name(Endpoint);

        impl $name {
            pub fn new(endpoint: Endpoint) -> Self {
                Self(endpoint)
            }

            pub fn parse(url: &str) -> crate::error::Result<Self> {
                Endpoint::parse(url).map(Self)
            }
        }

        impl ConnectionUri for $name {
            fn endpoint(&self) -> &Endpoint {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0.url())
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.addr() == other.addr()
            }
        }
        impl Eq for $name {}

        impl std::hash::Hash for $name {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                self.addr().hash(state)
            }
        }
    };
}

uri_newtype!(PeerUri, "A URI identifying an endorsing/event-source peer.");
uri_newtype!(OrdererUri, "A URI identifying an ordering-service node.");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_uri_display_round_trips_the_original_url() {
        let uri = PeerUri::parse("grpcs://peer0.org1.example.com:7051").unwrap();
        assert_eq!(uri.to_string(), "grpcs://peer0.org1.example.com:7051");
        assert_eq!(uri.addr(), "peer0.org1.example.com:7051");
    }

    #[test]
    fn equality_and_hash_are_keyed_on_addr() {
        let a = OrdererUri::parse("grpc://orderer.example.com:7050").unwrap();
        let b = OrdererUri::parse("grpc://orderer.example.com:7050").unwrap();
        assert_eq!(a, b);
    }
}
