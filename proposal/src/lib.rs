//! Proposal construction for install/instantiate/upgrade/invoke/query,
//! one shared builder dispatching on kind rather than a trait-object
//! hierarchy.

mod builder;
mod error;
mod package;
mod txid;

pub use crate::builder::{ChaincodeLanguage, DeploySpecOptions, ProposalBuilder, ProposalKind};
pub use crate::error::{ProposalBuildError, Result};
pub use crate::package::package_source;
pub use crate::txid::{compute_tx_id, new_nonce};
