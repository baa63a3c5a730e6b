//! Top-level facade: configuration, logging
//! bootstrap, and the `HFClient` that owns a caller's crypto suite,
//! signing identity, and registered channels.

mod config;
mod error;
mod hfclient;
pub mod logging;

pub use crate::config::ClientConfig;
pub use crate::error::{FabricError, Result};
pub use crate::hfclient::{parse_orderer_uri, parse_peer_uri, HFClient};

pub use fabric_channel::{Channel, ChannelOptions, ChannelState, PeerRoles, TransactionResult};
pub use fabric_crypto::{HashAlgorithm, SecurityLevel};
pub use fabric_identity::{Enrollment, Identity, Role};
pub use fabric_proposal::{ChaincodeLanguage, DeploySpecOptions, ProposalKind};
