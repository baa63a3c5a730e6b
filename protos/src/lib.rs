//! Generated message and service bindings for the Fabric wire
//! protocol, compiled from `proto/fabric/*.proto` by `build.rs`.
//! This crate has no hand-written logic; it is the external-contract
//! boundary generated straight from the `.proto` definitions.

pub mod common {
    tonic::include_proto!("fabric.common");
}

pub mod msp {
    tonic::include_proto!("fabric.msp");
}

pub mod protos {
    tonic::include_proto!("fabric.protos");
}

pub use common::*;
pub use msp::*;
pub use protos::*;
