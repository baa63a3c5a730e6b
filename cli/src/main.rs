//! `fabctl`: a thin binary exercising [`fabric_client::HFClient`]
//! end-to-end against a running Fabric network — install, instantiate,
//! invoke, and query a channel's chaincode from the command line.

mod commands;

use clap::Parser;
use commands::{Cli, Command};
use fabric_client::{
    parse_orderer_uri, parse_peer_uri, ChaincodeLanguage, ClientConfig, DeploySpecOptions,
    Enrollment, HFClient, Identity, PeerRoles, ProposalKind,
};
use fabric_protos::protos::ChaincodeID;
use std::collections::HashMap;
use std::error::Error;

fn load_identity(
    cli: &Cli,
    security_level: fabric_crypto::SecurityLevel,
) -> Result<Identity, Box<dyn Error>> {
    let cert_pem = std::fs::read_to_string(&cli.cert)?;
    let key_pem = std::fs::read_to_string(&cli.key)?;
    let key = fabric_crypto::KeyPair::from_pem(security_level, &key_pem)?;
    Ok(Identity::new(
        "fabctl",
        cli.msp_id.clone(),
        Enrollment { cert_pem, key },
    ))
}

fn split_fcn_and_args(raw: &[String]) -> Vec<Vec<u8>> {
    raw.iter().map(|arg| arg.clone().into_bytes()).collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    fabric_client::logging::init();
    let cli = Cli::parse();

    let config = ClientConfig::from_env_and_file(cli.config.as_deref())?;
    let identity = load_identity(&cli, config.security_level)?;
    let client = HFClient::new(config, identity)?;

    let channel = client.new_channel(cli.channel.clone())?;
    for anchor_path in &cli.trust_anchors {
        let pem = std::fs::read_to_string(anchor_path)?;
        channel.add_trust_anchor(&pem)?;
    }
    for peer in &cli.peers {
        channel.add_peer(parse_peer_uri(peer)?, PeerRoles::default())?;
    }
    for orderer in &cli.orderers {
        channel.add_orderer(parse_orderer_uri(orderer)?)?;
    }
    channel.initialize().await?;

    match cli.command {
        Command::Install {
            name,
            version,
            language,
            source_dir,
        } => {
            let chaincode_id = ChaincodeID {
                path: source_dir.display().to_string(),
                name,
                version,
            };
            let kind = ProposalKind::Install {
                chaincode_id,
                language: ChaincodeLanguage::parse(&language)?,
                source_dir,
                metadata: None,
            };
            let result = channel.submit_transaction(kind).await?;
            println!("installed in block {} (tx {})", result.block_number, result.tx_id);
        }

        Command::Instantiate {
            name,
            version,
            language,
            args,
        } => {
            let chaincode_id = ChaincodeID {
                path: String::new(),
                name,
                version,
            };
            let kind = ProposalKind::Instantiate {
                chaincode_id,
                language: ChaincodeLanguage::parse(&language)?,
                args: split_fcn_and_args(&args),
                options: DeploySpecOptions::default(),
            };
            let result = channel.submit_transaction(kind).await?;
            println!("instantiated in block {} (tx {})", result.block_number, result.tx_id);
        }

        Command::Invoke { name, version, args } => {
            let chaincode_id = ChaincodeID {
                path: String::new(),
                name,
                version,
            };
            let kind = ProposalKind::Invoke {
                chaincode_id,
                args: split_fcn_and_args(&args),
                transient: HashMap::new(),
            };
            let result = channel.submit_transaction(kind).await?;
            println!(
                "committed in block {} (tx {}): {}",
                result.block_number,
                result.tx_id,
                hex::encode(&result.proposal_response_payload)
            );
        }

        Command::Query { name, version, args } => {
            let chaincode_id = ChaincodeID {
                path: String::new(),
                name,
                version,
            };
            let kind = ProposalKind::Query {
                chaincode_id,
                args: split_fcn_and_args(&args),
                transient: HashMap::new(),
            };
            let payload = channel.query(kind).await?;
            println!("{}", String::from_utf8_lossy(&payload));
        }

        Command::QueryLedger { name, version, args } => {
            let chaincode_id = ChaincodeID {
                path: String::new(),
                name,
                version,
            };
            let kind = ProposalKind::Query {
                chaincode_id,
                args: split_fcn_and_args(&args),
                transient: HashMap::new(),
            };
            let payload = channel.query_ledger(kind).await?;
            println!("{}", String::from_utf8_lossy(&payload));
        }
    }

    client.shutdown_channel(&cli.channel);
    Ok(())
}
