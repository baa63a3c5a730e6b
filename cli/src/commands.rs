use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fabctl")]
#[command(about = "Exercise a Fabric channel: install/instantiate/invoke/query")]
#[command(version)]
pub struct Cli {
    /// MSP identifier for the signing identity.
    #[arg(long, env = "FABCTL_MSP_ID")]
    pub msp_id: String,

    /// Enrollment certificate, PEM-encoded.
    #[arg(long, env = "FABCTL_CERT")]
    pub cert: PathBuf,

    /// Enrollment private key, PEM-encoded (PKCS#8).
    #[arg(long, env = "FABCTL_KEY")]
    pub key: PathBuf,

    /// Channel to operate on.
    #[arg(long, env = "FABCTL_CHANNEL")]
    pub channel: String,

    /// Peer endpoint (`grpc://host:port` or `grpcs://host:port`), may
    /// repeat; each is registered with the default role set
    /// (endorsing + chaincode-query + ledger-query + event-source).
    #[arg(long = "peer", required = true)]
    pub peers: Vec<String>,

    /// Orderer endpoint, may repeat.
    #[arg(long = "orderer", required = true)]
    pub orderers: Vec<String>,

    /// Optional on-disk config file (`key.with.dots = value` TOML).
    #[arg(long, env = "FABCTL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Trust anchor certificate (PEM file), may repeat. If any are
    /// given, the signing identity must chain to one of them before
    /// `initialize` will proceed.
    #[arg(long = "trust-anchor")]
    pub trust_anchors: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Install chaincode from a packaged source directory.
    Install {
        #[arg(long)]
        name: String,
        #[arg(long)]
        version: String,
        /// golang | java | node
        #[arg(long, default_value = "golang")]
        language: String,
        #[arg(long)]
        source_dir: PathBuf,
    },

    /// Instantiate previously-installed chaincode on the channel.
    Instantiate {
        #[arg(long)]
        name: String,
        #[arg(long)]
        version: String,
        #[arg(long, default_value = "golang")]
        language: String,
        /// Constructor args: first is the function name, rest are
        /// positional parameters.
        #[arg(trailing_var_arg = true)]
        args: Vec<String>,
    },

    /// Submit a chaincode invocation (endorse, order, wait for commit).
    Invoke {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        version: String,
        /// First is the function name, rest are positional parameters.
        #[arg(trailing_var_arg = true)]
        args: Vec<String>,
    },

    /// Evaluate a chaincode query against the first responding peer.
    Query {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        version: String,
        /// First is the function name, rest are positional parameters.
        #[arg(trailing_var_arg = true)]
        args: Vec<String>,
    },

    /// Evaluate a ledger query (e.g. qscc) against the first
    /// responding ledger-query peer.
    QueryLedger {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        version: String,
        /// First is the function name, rest are positional parameters.
        #[arg(trailing_var_arg = true)]
        args: Vec<String>,
    },
}
