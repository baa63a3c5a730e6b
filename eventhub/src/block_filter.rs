use crate::error::{EventHubError, Result};
use fabric_protos::common::{Block, ChannelHeader, Envelope, Header, Payload, TxValidationCode};
use prost::Message;

/// Index of the transaction-validation-code filter within a block's
/// `BlockMetadataContents` (Fabric's `BlockMetadataIndex::TRANSACTIONS_FILTER`).
const TRANSACTIONS_FILTER_INDEX: usize = 2;

/// One transaction's outcome within a decoded block.
pub struct BlockTransaction {
    pub tx_id: String,
    pub validation_code: TxValidationCode,
}

/// Decode a block's transaction envelopes and pair each with its
/// validation code from the metadata filter.
pub fn transactions_in_block(block: &Block) -> Result<Vec<BlockTransaction>> {
    let data = block
        .data
        .as_ref()
        .ok_or_else(|| EventHubError::MalformedBlock("block has no data section".into()))?;
    let metadata = block
        .metadata
        .as_ref()
        .ok_or_else(|| EventHubError::MalformedBlock("block has no metadata section".into()))?;
    let filter = metadata
        .metadata
        .get(TRANSACTIONS_FILTER_INDEX)
        .ok_or_else(|| EventHubError::MalformedBlock("block has no transactions filter".into()))?;

    if filter.len() != data.data.len() {
        return Err(EventHubError::MalformedBlock(format!(
            "transactions filter length {} does not match envelope count {}",
            filter.len(),
            data.data.len()
        )));
    }

    data.data
        .iter()
        .zip(filter.iter())
        .map(|(envelope_bytes, code_byte)| {
            let envelope = Envelope::decode(envelope_bytes.as_slice())
                .map_err(|e| EventHubError::MalformedBlock(e.to_string()))?;
            let payload = Payload::decode(envelope.payload.as_slice())
                .map_err(|e| EventHubError::MalformedBlock(e.to_string()))?;
            let header = payload
                .header
                .ok_or_else(|| EventHubError::MalformedBlock("payload has no header".into()))?;
            let channel_header = ChannelHeader::decode(header.channel_header.as_slice())
                .map_err(|e| EventHubError::MalformedBlock(e.to_string()))?;
            let validation_code = TxValidationCode::from_i32(*code_byte as i32)
                .unwrap_or(TxValidationCode::InvalidOtherReason);
            Ok(BlockTransaction {
                tx_id: channel_header.tx_id,
                validation_code,
            })
        })
        .collect()
}
