//! The channel orchestrator: peer/orderer registry, endorsement
//! fan-out and consistency validation, transaction submission, and
//! commit tracking via the event hubs it owns.

mod channel;
mod config;
mod error;
mod fan_out;
mod registry;
mod role;
mod serialize;
mod submission;

pub use crate::channel::{Channel, ChannelState, TransactionResult};
pub use crate::config::ChannelOptions;
pub use crate::error::{ChannelError, Result};
pub use crate::fan_out::EndorsementOutcome;
pub use crate::role::PeerRoles;
pub use crate::serialize::{from_bytes, to_bytes, RestoredEndpoints};
