//! Peer (endorser) and orderer gRPC clients, plus the transport
//! builder and retry helper they share.

mod error;
mod orderer_client;
mod peer_client;
mod retry;
mod transport;

pub use crate::error::{ConnectionError, Result};
pub use crate::orderer_client::{is_success, OrdererClient};
pub use crate::peer_client::PeerClient;
pub use crate::retry::with_retry;
pub use crate::transport::build_channel;
