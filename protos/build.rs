//! Compiles the hand-authored `.proto` schemas under `proto/fabric/`
//! into Rust types + tonic client/server stubs. Stands in for the
//! canonical Fabric `.proto` set, which is treated as an external
//! contract by this client.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tonic_build::configure().build_server(true).build_client(true).compile(
        &[
            "proto/fabric/common.proto",
            "proto/fabric/msp.proto",
            "proto/fabric/chaincode.proto",
            "proto/fabric/proposal.proto",
            "proto/fabric/transaction.proto",
            "proto/fabric/peer.proto",
            "proto/fabric/orderer.proto",
        ],
        &["proto"],
    )?;
    Ok(())
}
