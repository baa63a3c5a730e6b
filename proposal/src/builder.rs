use crate::error::{ProposalBuildError, Result};
use crate::package;
use crate::txid::{compute_tx_id, new_nonce};
use fabric_crypto::CryptoSuite;
use fabric_identity::SigningContext;
use fabric_protos::common::{ChannelHeader, Header, SignatureHeader};
use fabric_protos::protos::chaincode_spec::Type as ChaincodeSpecType;
use fabric_protos::protos::{
    ChaincodeDeploymentSpec, ChaincodeHeaderExtension, ChaincodeID, ChaincodeInput,
    ChaincodeInvocationSpec, ChaincodeProposalPayload, ChaincodeSpec, Proposal, SignedProposal,
};
use prost::Message;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// Fabric's `common.HeaderType.ENDORSER_TRANSACTION`. The canonical
/// `.proto` defines more variants; this client only ever emits this one.
const HEADER_TYPE_ENDORSER_TRANSACTION: i32 = 3;

/// Chaincode implementation language. Unknown types reject with an
/// argument error.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChaincodeLanguage {
    Golang,
    Java,
    Node,
}

impl ChaincodeLanguage {
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "golang" | "go" => Ok(Self::Golang),
            "java" => Ok(Self::Java),
            "node" | "javascript" | "node.js" => Ok(Self::Node),
            other => Err(ProposalBuildError::UnsupportedChaincodeType(other.to_string())),
        }
    }

    fn to_spec_type(self) -> ChaincodeSpecType {
        match self {
            Self::Golang => ChaincodeSpecType::Golang,
            Self::Java => ChaincodeSpecType::Java,
            Self::Node => ChaincodeSpecType::Node,
        }
    }
}

/// The deploy-family args shared by instantiate and upgrade.
#[derive(Clone, Debug, Default)]
pub struct DeploySpecOptions {
    pub endorsement_policy: Option<Vec<u8>>,
    pub escc_name: Option<String>,
    pub vscc_name: Option<String>,
    pub collection_config: Option<Vec<u8>>,
}

/// One proposal variant, dispatched in [`ProposalBuilder::build`]
/// rather than through a trait-object hierarchy.
pub enum ProposalKind {
    Install {
        chaincode_id: ChaincodeID,
        language: ChaincodeLanguage,
        source_dir: PathBuf,
        metadata: Option<Vec<u8>>,
    },
    Instantiate {
        chaincode_id: ChaincodeID,
        language: ChaincodeLanguage,
        args: Vec<Vec<u8>>,
        options: DeploySpecOptions,
    },
    Upgrade {
        chaincode_id: ChaincodeID,
        language: ChaincodeLanguage,
        args: Vec<Vec<u8>>,
        options: DeploySpecOptions,
    },
    Invoke {
        chaincode_id: ChaincodeID,
        args: Vec<Vec<u8>>,
        transient: HashMap<String, Vec<u8>>,
    },
    Query {
        chaincode_id: ChaincodeID,
        args: Vec<Vec<u8>>,
        transient: HashMap<String, Vec<u8>>,
    },
}

const LSCC_NAME: &str = "lscc";

/// Assembles a signed proposal from the shared fields (channel, creator,
/// nonce, TxID) plus a [`ProposalKind`]-specific payload.
pub struct ProposalBuilder<'a> {
    pub channel_id: String,
    pub signing_context: &'a SigningContext,
    pub crypto_suite: &'a CryptoSuite,
    pub tls_cert_hash: Option<String>,
}

impl<'a> ProposalBuilder<'a> {
    pub fn new(
        channel_id: impl Into<String>,
        signing_context: &'a SigningContext,
        crypto_suite: &'a CryptoSuite,
    ) -> Self {
        Self {
            channel_id: channel_id.into(),
            signing_context,
            crypto_suite,
            tls_cert_hash: None,
        }
    }

    pub fn with_tls_cert_hash(mut self, hash: impl Into<String>) -> Self {
        self.tls_cert_hash = Some(hash.into());
        self
    }

    /// Build and sign the proposal, returning both the TxID (needed to
    /// register a commit listener) and the wire-ready `SignedProposal`.
    pub fn build(&self, kind: ProposalKind) -> Result<(String, SignedProposal)> {
        let nonce = new_nonce();
        let creator = self.signing_context.serialized_identity().to_vec();
        let tx_id = compute_tx_id(self.crypto_suite, &nonce, &creator);

        let header_extension_chaincode_id = match &kind {
            ProposalKind::Install { chaincode_id, .. } => chaincode_id.clone(),
            ProposalKind::Instantiate { .. } | ProposalKind::Upgrade { .. } => ChaincodeID {
                name: LSCC_NAME.to_string(),
                ..Default::default()
            },
            ProposalKind::Invoke { chaincode_id, .. } | ProposalKind::Query { chaincode_id, .. } => {
                chaincode_id.clone()
            }
        };

        let channel_header = ChannelHeader {
            r#type: HEADER_TYPE_ENDORSER_TRANSACTION,
            version: 1,
            timestamp_seconds: now_seconds(),
            channel_id: self.channel_id.clone(),
            tx_id: tx_id.clone(),
            epoch: 0,
            extension: ChaincodeHeaderExtension {
                chaincode_id: Some(header_extension_chaincode_id),
            }
            .encode_to_vec(),
            tls_cert_hash: self.tls_cert_hash.clone().unwrap_or_default(),
        };
        let signature_header = SignatureHeader {
            creator: creator.clone(),
            nonce: nonce.clone(),
        };
        let header = Header {
            channel_header: channel_header.encode_to_vec(),
            signature_header: signature_header.encode_to_vec(),
        };

        let (invocation_input, transient) = self.build_invocation(kind)?;
        let payload = ChaincodeProposalPayload {
            input: invocation_input,
            transient_map: transient,
        };

        let proposal = Proposal {
            header: header.encode_to_vec(),
            payload: payload.encode_to_vec(),
            extension: Vec::new(),
        };
        let proposal_bytes = proposal.encode_to_vec();
        let signature = self.signing_context.sign(self.crypto_suite, &proposal_bytes);

        Ok((
            tx_id,
            SignedProposal {
                proposal_bytes,
                signature,
            },
        ))
    }

    /// Returns the encoded `ChaincodeInvocationSpec` for the proposal
    /// payload's `input` field, plus the transient map (empty for
    /// install/instantiate/upgrade).
    fn build_invocation(&self, kind: ProposalKind) -> Result<(Vec<u8>, HashMap<String, Vec<u8>>)> {
        match kind {
            ProposalKind::Install {
                chaincode_id,
                language,
                source_dir,
                metadata,
            } => {
                let code_package = package::package_source(&source_dir)?;
                let dep_spec = ChaincodeDeploymentSpec {
                    chaincode_spec: Some(ChaincodeSpec {
                        r#type: language.to_spec_type() as i32,
                        chaincode_id: Some(chaincode_id),
                        input: Some(ChaincodeInput::default()),
                        timeout: 0,
                    }),
                    code_package,
                    chaincode_metadata: metadata.unwrap_or_default(),
                };
                let args = vec![b"install".to_vec(), dep_spec.encode_to_vec()];
                Ok((self.lscc_invocation(args), HashMap::new()))
            }
            ProposalKind::Instantiate {
                chaincode_id,
                language,
                args: cc_args,
                options,
            } => self.deploy_invocation("deploy", chaincode_id, language, cc_args, options),
            ProposalKind::Upgrade {
                chaincode_id,
                language,
                args: cc_args,
                options,
            } => self.deploy_invocation("upgrade", chaincode_id, language, cc_args, options),
            ProposalKind::Invoke {
                chaincode_id,
                args,
                transient,
            }
            | ProposalKind::Query {
                chaincode_id,
                args,
                transient,
            } => {
                let spec = ChaincodeSpec {
                    r#type: ChaincodeSpecType::Golang as i32,
                    chaincode_id: Some(chaincode_id),
                    input: Some(ChaincodeInput {
                        args,
                        decorations: Default::default(),
                        is_init: false,
                    }),
                    timeout: 0,
                };
                let invocation = ChaincodeInvocationSpec {
                    chaincode_spec: Some(spec),
                };
                Ok((invocation.encode_to_vec(), transient))
            }
        }
    }

    fn deploy_invocation(
        &self,
        action: &str,
        chaincode_id: ChaincodeID,
        language: ChaincodeLanguage,
        cc_args: Vec<Vec<u8>>,
        options: DeploySpecOptions,
    ) -> Result<(Vec<u8>, HashMap<String, Vec<u8>>)> {
        let dep_spec = ChaincodeDeploymentSpec {
            chaincode_spec: Some(ChaincodeSpec {
                r#type: language.to_spec_type() as i32,
                chaincode_id: Some(chaincode_id),
                input: Some(ChaincodeInput {
                    args: cc_args,
                    decorations: Default::default(),
                    is_init: false,
                }),
                timeout: 0,
            }),
            code_package: Vec::new(),
            chaincode_metadata: Vec::new(),
        };

        // Positional args after `depSpec`; later-present-but-earlier-absent
        // slots are filled with empty placeholders.
        let mut trailing: Vec<Vec<u8>> = Vec::new();
        let present = [
            options.endorsement_policy.is_some(),
            options.escc_name.is_some(),
            options.vscc_name.is_some(),
            options.collection_config.is_some(),
        ];
        let last_present = present.iter().rposition(|p| *p);
        if let Some(last) = last_present {
            trailing.push(options.endorsement_policy.clone().unwrap_or_default());
            if last >= 1 {
                trailing.push(options.escc_name.clone().unwrap_or_default().into_bytes());
            }
            if last >= 2 {
                trailing.push(options.vscc_name.clone().unwrap_or_default().into_bytes());
            }
            if last >= 3 {
                trailing.push(options.collection_config.clone().unwrap_or_default());
            }
        }

        let mut args = vec![action.as_bytes().to_vec(), self.channel_id.clone().into_bytes(), dep_spec.encode_to_vec()];
        args.extend(trailing);
        Ok((self.lscc_invocation(args), HashMap::new()))
    }

    fn lscc_invocation(&self, args: Vec<Vec<u8>>) -> Vec<u8> {
        let spec = ChaincodeSpec {
            r#type: ChaincodeSpecType::Golang as i32,
            chaincode_id: Some(ChaincodeID {
                name: LSCC_NAME.to_string(),
                ..Default::default()
            }),
            input: Some(ChaincodeInput {
                args,
                decorations: Default::default(),
                is_init: false,
            }),
            timeout: 0,
        };
        ChaincodeInvocationSpec {
            chaincode_spec: Some(spec),
        }
        .encode_to_vec()
    }
}

fn now_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabric_crypto::{CryptoSuite, CryptoSuiteOptions};
    use fabric_identity::{Enrollment, Identity};

    fn signing_context() -> (CryptoSuite, SigningContext) {
        let suite = CryptoSuite::new(CryptoSuiteOptions::default());
        let key = suite.key_gen();
        let cert_pem = fabric_crypto::dev_self_signed_cert(&key, "admin.org1.example.com");
        let identity = Identity::new("admin", "Org1MSP", Enrollment { cert_pem, key });
        let ctx = SigningContext::bind(identity, &suite).unwrap();
        (suite, ctx)
    }

    #[test]
    fn chaincode_language_parse_rejects_unknown() {
        assert!(ChaincodeLanguage::parse("rust").is_err());
        assert!(ChaincodeLanguage::parse("golang").is_ok());
        assert!(ChaincodeLanguage::parse("Node").is_ok());
    }

    #[test]
    fn invoke_proposal_builds_and_tx_id_matches_nonce_creator() {
        let (suite, ctx) = signing_context();
        let builder = ProposalBuilder::new("mychannel", &ctx, &suite);
        let kind = ProposalKind::Invoke {
            chaincode_id: ChaincodeID {
                name: "mycc".into(),
                ..Default::default()
            },
            args: vec![b"invoke".to_vec(), b"a".to_vec(), b"b".to_vec(), b"10".to_vec()],
            transient: HashMap::new(),
        };
        let (tx_id, signed) = builder.build(kind).unwrap();
        assert_eq!(tx_id.len(), 64);
        assert!(!signed.signature.is_empty());

        let proposal = Proposal::decode(signed.proposal_bytes.as_slice()).unwrap();
        let header = Header::decode(proposal.header.as_slice()).unwrap();
        let channel_header = ChannelHeader::decode(header.channel_header.as_slice()).unwrap();
        assert_eq!(channel_header.tx_id, tx_id);
        assert_eq!(channel_header.channel_id, "mychannel");
    }

    #[test]
    fn instantiate_inserts_placeholders_for_skipped_positional_args() {
        let (suite, ctx) = signing_context();
        let builder = ProposalBuilder::new("mychannel", &ctx, &suite);
        let kind = ProposalKind::Instantiate {
            chaincode_id: ChaincodeID {
                name: "mycc".into(),
                version: "1.0".into(),
                ..Default::default()
            },
            language: ChaincodeLanguage::Golang,
            args: vec![b"init".to_vec()],
            options: DeploySpecOptions {
                vscc_name: Some("vscc".into()),
                ..Default::default()
            },
        };
        let (_tx_id, signed) = builder.build(kind).unwrap();
        let proposal = Proposal::decode(signed.proposal_bytes.as_slice()).unwrap();
        let payload = ChaincodeProposalPayload::decode(proposal.payload.as_slice()).unwrap();
        let invocation = ChaincodeInvocationSpec::decode(payload.input.as_slice()).unwrap();
        let spec_args = &invocation.chaincode_spec.unwrap().input.unwrap().args;
        // action, channelID, depSpec, endorsementPolicy(placeholder), esccName(placeholder), vsccName
        assert_eq!(spec_args.len(), 6);
        assert_eq!(spec_args[0], b"deploy");
        assert!(spec_args[3].is_empty());
        assert!(spec_args[4].is_empty());
        assert_eq!(spec_args[5], b"vscc");
    }

    #[test]
    fn install_packages_source_and_targets_lscc() {
        let (suite, ctx) = signing_context();
        let dir = std::env::temp_dir().join(format!("fabric-proposal-install-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("main.go"), b"package main").unwrap();

        let builder = ProposalBuilder::new("mychannel", &ctx, &suite);
        let kind = ProposalKind::Install {
            chaincode_id: ChaincodeID {
                name: "mycc".into(),
                version: "1.0".into(),
                ..Default::default()
            },
            language: ChaincodeLanguage::Golang,
            source_dir: dir.clone(),
            metadata: None,
        };
        let (_tx_id, signed) = builder.build(kind).unwrap();
        let proposal = Proposal::decode(signed.proposal_bytes.as_slice()).unwrap();
        let payload = ChaincodeProposalPayload::decode(proposal.payload.as_slice()).unwrap();
        let invocation = ChaincodeInvocationSpec::decode(payload.input.as_slice()).unwrap();
        let spec = invocation.chaincode_spec.unwrap();
        assert_eq!(spec.chaincode_id.unwrap().name, LSCC_NAME);
        assert_eq!(spec.input.unwrap().args[0], b"install");

        std::fs::remove_dir_all(&dir).ok();
    }
}
