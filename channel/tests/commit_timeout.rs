//! The orderer accepts the broadcast but the peer never announces a
//! commit block; `submit_transaction` must time out rather than hang.

mod support;

use fabric_channel::{Channel, ChannelError, ChannelOptions, PeerRoles};
use fabric_proposal::ProposalKind;
use fabric_protos::protos::{BroadcastStatusCode, ChaincodeID};
use fabric_uri::{OrdererUri, PeerUri};
use std::collections::HashMap;
use std::time::Duration;
use support::{test_identity, MockOrderer, MockPeer};

#[tokio::test]
async fn submit_transaction_times_out_waiting_for_a_commit_block() {
    let peer_url = MockPeer::new(false).serve().await;
    let orderer_url = MockOrderer::new(BroadcastStatusCode::Success).serve().await;

    let (crypto_suite, signing_context) = test_identity("admin.org1.example.com");
    let options = ChannelOptions {
        transaction_cleanup_timeout: Duration::from_millis(200),
        service_discovery_freq_seconds: None,
        ..ChannelOptions::default()
    };
    let channel = Channel::new("mychannel", signing_context, crypto_suite, options);

    channel
        .add_peer(PeerUri::parse(&peer_url).unwrap(), PeerRoles::default())
        .unwrap();
    channel
        .add_orderer(OrdererUri::parse(&orderer_url).unwrap())
        .unwrap();
    channel.initialize().await.unwrap();

    let kind = ProposalKind::Invoke {
        chaincode_id: ChaincodeID {
            name: "mycc".into(),
            ..Default::default()
        },
        args: vec![b"invoke".to_vec()],
        transient: HashMap::new(),
    };
    let result = channel.submit_transaction(kind).await;

    assert!(matches!(result, Err(ChannelError::TransactionTimeout)));

    channel.shutdown();
}
