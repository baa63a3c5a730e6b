use crate::channel::Channel;
use crate::error::{ChannelError, Result};
use crate::role::PeerRoles;
use fabric_uri::{ConnectionUri, OrdererUri, PeerUri};
use serde::{Deserialize, Serialize};

/// Bumped whenever [`ChannelBlob`]'s shape changes; `from_bytes`
/// rejects anything it doesn't recognize rather than guessing.
const CHANNEL_BLOB_VERSION: u8 = 1;

#[derive(Serialize, Deserialize)]
struct PeerRecord {
    uri: String,
    roles: u8,
}

#[derive(Serialize, Deserialize)]
struct ChannelBlob {
    channel_id: String,
    orderers: Vec<String>,
    peers: Vec<PeerRecord>,
}

/// The durable part of a channel's registration state: its name and
/// the peer/orderer endpoints joined to it. Crypto material and live
/// connections are never persisted — reconstructing a [`Channel`] from
/// bytes still requires a `SigningContext`/`CryptoSuite` and a fresh
/// `initialize()` call.
pub fn to_bytes(channel: &Channel) -> Result<Vec<u8>> {
    let blob = ChannelBlob {
        channel_id: channel.channel_id().to_string(),
        orderers: channel
            .registry
            .orderers()
            .iter()
            .map(|o| o.uri().to_string())
            .collect(),
        peers: channel
            .registry
            .all_peers()
            .iter()
            .map(|(client, roles)| PeerRecord {
                uri: client.uri().to_string(),
                roles: roles.bits(),
            })
            .collect(),
    };
    let mut bytes = vec![CHANNEL_BLOB_VERSION];
    bytes.extend(
        bincode::serialize(&blob).map_err(|e| ChannelError::Serialization(e.to_string()))?,
    );
    Ok(bytes)
}

/// The restored endpoint set: the peer/orderer URIs a caller should
/// re-register on a freshly-constructed [`Channel`] before calling
/// `initialize()` again.
pub struct RestoredEndpoints {
    pub channel_id: String,
    pub orderers: Vec<OrdererUri>,
    pub peers: Vec<(PeerUri, PeerRoles)>,
}

pub fn from_bytes(bytes: &[u8]) -> Result<RestoredEndpoints> {
    let (version, rest) = bytes
        .split_first()
        .ok_or_else(|| ChannelError::Serialization("empty channel blob".into()))?;
    if *version != CHANNEL_BLOB_VERSION {
        return Err(ChannelError::Serialization(format!(
            "unsupported channel blob version {version}"
        )));
    }
    let blob: ChannelBlob =
        bincode::deserialize(rest).map_err(|e| ChannelError::Serialization(e.to_string()))?;

    let orderers = blob
        .orderers
        .iter()
        .map(|u| OrdererUri::parse(u).map_err(ChannelError::from))
        .collect::<Result<Vec<_>>>()?;
    let peers = blob
        .peers
        .iter()
        .map(|record| {
            let uri = PeerUri::parse(&record.uri)?;
            let roles = PeerRoles::from_bits_truncate(record.roles);
            Ok((uri, roles))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(RestoredEndpoints {
        channel_id: blob.channel_id,
        orderers,
        peers,
    })
}
