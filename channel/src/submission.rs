use crate::error::{ChannelError, Result};
use fabric_connection::OrdererClient;
use fabric_crypto::CryptoSuite;
use fabric_identity::SigningContext;
use fabric_protos::common::{Envelope, Header, Payload};
use fabric_protos::protos::{
    ChaincodeActionPayload, ChaincodeEndorsedAction, ProposalResponse, SignedProposal, Transaction,
    TransactionAction,
};
use prost::Message;
use std::time::Duration;

/// Assemble the signed transaction envelope from a proposal and its
/// consistent set of successful endorsements:
/// `ChaincodeEndorsedAction` -> `ChaincodeActionPayload` ->
/// `TransactionAction` -> `Transaction` -> `Payload` -> `Envelope`.
pub fn build_transaction_envelope(
    signed_proposal: &SignedProposal,
    endorsements: &[&ProposalResponse],
    signing_context: &SigningContext,
    crypto_suite: &CryptoSuite,
) -> Result<Envelope> {
    let proposal = fabric_protos::protos::Proposal::decode(signed_proposal.proposal_bytes.as_slice())
        .map_err(|e| ChannelError::Decode(e.to_string()))?;

    let consistent_payload = endorsements[0].payload.clone();
    let endorsement_list = endorsements
        .iter()
        .filter_map(|r| r.endorsement.clone())
        .collect();

    let endorsed_action = ChaincodeEndorsedAction {
        proposal_response_payload: consistent_payload,
        endorsements: endorsement_list,
    };
    let action_payload = ChaincodeActionPayload {
        chaincode_proposal_payload: proposal.payload.clone(),
        action: Some(endorsed_action),
    };
    let tx_action = TransactionAction {
        header: proposal.header.clone(),
        payload: action_payload.encode_to_vec(),
    };
    let transaction = Transaction {
        actions: vec![tx_action],
    };

    let header = Header::decode(proposal.header.as_slice())
        .map_err(|e| ChannelError::Decode(e.to_string()))?;
    let payload = Payload {
        header: Some(header),
        data: transaction.encode_to_vec(),
    };
    let payload_bytes = payload.encode_to_vec();
    let signature = signing_context.sign(crypto_suite, &payload_bytes);

    Ok(Envelope {
        payload: payload_bytes,
        signature,
    })
}

/// Broadcast `envelope` to `orderers`, retrying the whole round against
/// the next orderer in the list up to `attempts` times, waiting
/// `retry_wait` between attempts.
pub async fn broadcast_with_retry(
    orderers: &[OrdererClient],
    envelope: Envelope,
    attempts: usize,
    retry_wait: Duration,
    deadline: Duration,
) -> Result<()> {
    if orderers.is_empty() {
        return Err(ChannelError::Argument(
            "no orderer registered for submission".into(),
        ));
    }

    let mut last_error = None;
    for attempt in 0..attempts.max(1) {
        let orderer = &orderers[attempt % orderers.len()];
        let outcome = tokio::time::timeout(deadline, orderer.broadcast(envelope.clone()))
            .await
            .map_err(|_| fabric_connection::ConnectionError::Timeout)
            .and_then(|r| r);
        match outcome {
            Ok(response) => {
                let code = fabric_protos::protos::BroadcastStatusCode::from_i32(response.status)
                    .unwrap_or(fabric_protos::protos::BroadcastStatusCode::ServiceUnavailable);
                if fabric_connection::is_success(code) {
                    return Ok(());
                }
                last_error = Some(ChannelError::Transaction(format!("{:?}", code)));
            }
            Err(error) => last_error = Some(ChannelError::from(error)),
        }
        if attempt + 1 < attempts {
            tokio::time::sleep(retry_wait).await;
        }
    }
    Err(last_error.unwrap_or(ChannelError::Transaction("no orderer attempted".into())))
}

/// Unique-enough key for correlating a submitted transaction with its
/// eventual commit notification.
pub fn derive_tx_id(signed_proposal: &SignedProposal) -> Result<String> {
    let proposal = fabric_protos::protos::Proposal::decode(signed_proposal.proposal_bytes.as_slice())
        .map_err(|e| ChannelError::Decode(e.to_string()))?;
    let header = Header::decode(proposal.header.as_slice())
        .map_err(|e| ChannelError::Decode(e.to_string()))?;
    let channel_header = fabric_protos::common::ChannelHeader::decode(
        header
            .channel_header
            .as_slice(),
    )
    .map_err(|e| ChannelError::Decode(e.to_string()))?;
    Ok(channel_header.tx_id)
}

