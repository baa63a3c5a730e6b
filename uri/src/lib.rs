//! URL parsing, transport credential assembly, and connection-URI
//! newtypes for the Fabric client.

mod cn_cache;
mod connection_uri;
mod endpoint;
mod error;

pub use crate::cn_cache::common_name_for;
pub use crate::connection_uri::{ConnectionUri, OrdererUri, PeerUri};
pub use crate::endpoint::{ClientKeyPair, Credentials, Endpoint, GrpcOption, Protocol};
pub use crate::error::{Result, UriError};
