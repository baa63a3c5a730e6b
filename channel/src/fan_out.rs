use crate::error::{ChannelError, Result};
use fabric_connection::PeerClient;
use fabric_protos::protos::{ProposalResponse, SignedProposal};
use futures::future::join_all;
use std::collections::HashMap;
use std::time::Duration;

/// One peer's endorsement outcome: either it returned a response
/// (successful or not, per its status code) or the call itself failed.
pub enum EndorsementOutcome {
    Response { peer: PeerClient, response: ProposalResponse },
    Failed { peer: PeerClient, error: fabric_connection::ConnectionError },
}

/// A response with status in `[200, 400)` is successful.
fn is_successful(response: &ProposalResponse) -> bool {
    let status = response.response.as_ref().map(|r| r.status).unwrap_or(0);
    (200..400).contains(&status)
}

/// Dispatch `signed_proposal` concurrently to every peer in `peers`,
/// each bounded by `deadline`.
pub async fn dispatch(
    peers: &[PeerClient],
    signed_proposal: &SignedProposal,
    deadline: Duration,
) -> Vec<EndorsementOutcome> {
    let calls = peers.iter().cloned().map(|peer| {
        let signed_proposal = signed_proposal.clone();
        async move {
            match peer.process_proposal(signed_proposal, deadline).await {
                Ok(response) => EndorsementOutcome::Response { peer, response },
                Err(error) => EndorsementOutcome::Failed { peer, error },
            }
        }
    });
    join_all(calls).await
}

/// Every response with a successful status code, regardless of
/// payload agreement — used when consistency validation is disabled
/// but the caller still needs every endorsement to assemble a
/// multi-signature endorsement.
pub fn collect_successful(outcomes: &[EndorsementOutcome]) -> Result<Vec<&ProposalResponse>> {
    let successful: Vec<&ProposalResponse> = outcomes
        .iter()
        .filter_map(|o| match o {
            EndorsementOutcome::Response { response, .. } if is_successful(response) => {
                Some(response)
            }
            _ => None,
        })
        .collect();

    if successful.is_empty() {
        return Err(ChannelError::NoSuccessfulEndorsement);
    }

    Ok(successful)
}

/// Validate that every successful response falls into a single
/// consistency set, grouped by `(proposalHash, payload)` — in this
/// wire format, the outer `ProposalResponse.payload` bytes (an encoded
/// `ProposalResponsePayload`) already pair the two, so equality on
/// those bytes is the consistency check.
pub fn validate_consistency(outcomes: &[EndorsementOutcome]) -> Result<Vec<&ProposalResponse>> {
    let successful = collect_successful(outcomes)?;

    let mut groups: HashMap<&[u8], usize> = HashMap::new();
    for response in &successful {
        *groups.entry(response.payload.as_slice()).or_insert(0) += 1;
    }

    if groups.len() > 1 {
        return Err(ChannelError::Consistency(successful.len()));
    }

    Ok(successful)
}
