use fabric_crypto::CryptoSuite;
use fabric_identity::SigningContext;
use fabric_protos::common::{ChannelHeader, Envelope, Header, Payload, SignatureHeader};
use fabric_protos::protos::seek_position::Type as SeekPositionType;
use fabric_protos::protos::{SeekBehavior, SeekInfo, SeekNewest, SeekOldest, SeekPosition, SeekSpecified};
use prost::Message;
use std::time::{SystemTime, UNIX_EPOCH};

/// Fabric's `common.HeaderType.DELIVER_SEEK_INFO`.
const HEADER_TYPE_DELIVER_SEEK_INFO: i32 = 8;

/// Where replay should resume from on (re)connect: the cursor resumes
/// from lastBlockNum + 1, or NEWEST if no block has ever been seen.
pub enum ReplayFrom {
    Newest,
    BlockNumber(u64),
}

fn position(from: ReplayFrom) -> SeekPosition {
    let inner = match from {
        ReplayFrom::Newest => SeekPositionType::Newest(SeekNewest {}),
        ReplayFrom::BlockNumber(n) => SeekPositionType::Specified(SeekSpecified { number: n }),
    };
    SeekPosition { r#type: Some(inner) }
}

fn unbounded_stop() -> SeekPosition {
    SeekPosition {
        r#type: Some(SeekPositionType::Newest(SeekNewest {})),
    }
}

/// Build and sign a `SeekInfo` envelope that reads exactly one block
/// (start and stop the same position, `FAIL_IF_NOT_READY`) — used for
/// one-shot config-block reads against the orderer rather than the
/// event hub's open-ended replay stream.
pub fn single_block_envelope(
    channel_id: &str,
    from: ReplayFrom,
    signing_context: &SigningContext,
    crypto_suite: &CryptoSuite,
) -> Envelope {
    let start = position(from);
    let seek_info = SeekInfo {
        stop: Some(start.clone()),
        start: Some(start),
        behavior: SeekBehavior::FailIfNotReady as i32,
    };

    let creator = signing_context.serialized_identity().to_vec();
    let mut nonce = vec![0u8; 24];
    rand_fill(&mut nonce);

    let channel_header = ChannelHeader {
        r#type: HEADER_TYPE_DELIVER_SEEK_INFO,
        version: 1,
        timestamp_seconds: now_seconds(),
        channel_id: channel_id.to_string(),
        tx_id: String::new(),
        epoch: 0,
        extension: Vec::new(),
        tls_cert_hash: String::new(),
    };
    let signature_header = SignatureHeader { creator, nonce };
    let header = Header {
        channel_header: channel_header.encode_to_vec(),
        signature_header: signature_header.encode_to_vec(),
    };
    let payload = Payload {
        header: Some(header),
        data: seek_info.encode_to_vec(),
    };
    let payload_bytes = payload.encode_to_vec();
    let signature = signing_context.sign(crypto_suite, &payload_bytes);

    Envelope {
        payload: payload_bytes,
        signature,
    }
}

/// Build and sign the registration envelope for a peer's `Deliver`
/// stream: a `SeekInfo` requesting an unbounded block-until-ready
/// stream starting at `from`.
pub fn registration_envelope(
    channel_id: &str,
    from: ReplayFrom,
    signing_context: &SigningContext,
    crypto_suite: &CryptoSuite,
) -> Envelope {
    let seek_info = SeekInfo {
        start: Some(position(from)),
        stop: Some(unbounded_stop()),
        behavior: SeekBehavior::BlockUntilReady as i32,
    };

    let creator = signing_context.serialized_identity().to_vec();
    let mut nonce = vec![0u8; 24];
    rand_fill(&mut nonce);

    let channel_header = ChannelHeader {
        r#type: HEADER_TYPE_DELIVER_SEEK_INFO,
        version: 1,
        timestamp_seconds: now_seconds(),
        channel_id: channel_id.to_string(),
        tx_id: String::new(),
        epoch: 0,
        extension: Vec::new(),
        tls_cert_hash: String::new(),
    };
    let signature_header = SignatureHeader {
        creator,
        nonce,
    };
    let header = Header {
        channel_header: channel_header.encode_to_vec(),
        signature_header: signature_header.encode_to_vec(),
    };
    let payload = Payload {
        header: Some(header),
        data: seek_info.encode_to_vec(),
    };
    let payload_bytes = payload.encode_to_vec();
    let signature = signing_context.sign(crypto_suite, &payload_bytes);

    Envelope {
        payload: payload_bytes,
        signature,
    }
}

fn rand_fill(buf: &mut [u8]) {
    use rand::RngCore;
    rand::thread_rng().fill_bytes(buf);
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
    use fabric_protos::common::Payload;

    fn signing_context() -> (CryptoSuite, SigningContext) {
        let suite = CryptoSuite::new(CryptoSuiteOptions::default());
        let key = suite.key_gen();
        let cert_pem = fabric_crypto::dev_self_signed_cert(&key, "peer0.org1.example.com");
        let identity = Identity::new("peer0", "Org1MSP", Enrollment { cert_pem, key });
        let ctx = SigningContext::bind(identity, &suite).unwrap();
        (suite, ctx)
    }

    #[test]
    fn registration_envelope_carries_a_decodable_seek_info() {
        let (suite, ctx) = signing_context();
        let envelope = registration_envelope("mychannel", ReplayFrom::Newest, &ctx, &suite);
        assert!(!envelope.signature.is_empty());

        let payload = Payload::decode(envelope.payload.as_slice()).unwrap();
        let header = payload.header.expect("payload carries a header");
        let channel_header = ChannelHeader::decode(header.channel_header.as_slice()).unwrap();
        assert_eq!(channel_header.channel_id, "mychannel");
        let seek_info = SeekInfo::decode(payload.data.as_slice()).unwrap();
        assert!(matches!(
            seek_info.start.unwrap().r#type,
            Some(SeekPositionType::Newest(_))
        ));
    }
}
