//! A minimal `Deliver`-only mock peer for exercising reconnect and
//! replay-gap handling without a full endorser/orderer stack.

use std::pin::Pin;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use fabric_crypto::{CryptoSuite, CryptoSuiteOptions};
use fabric_identity::{Enrollment, Identity, SigningContext};
use fabric_protos::common::{
    Block, BlockData, BlockHeader, BlockMetadataContents, ChannelHeader, Envelope, Header, Payload,
    SignatureHeader, TxValidationCode,
};
use fabric_protos::protos::deliver_response::Type as DeliverResponseType;
use fabric_protos::protos::deliver_server::{Deliver, DeliverServer};
use fabric_protos::protos::DeliverResponse;
use futures::stream::{self, Stream};
use prost::Message;
use tokio::net::{TcpListener, TcpStream};
use tonic::transport::Server;
use tonic::{async_trait, Request, Response as GrpcResponse, Status, Streaming};

pub type BoxStream<T> = Pin<Box<dyn Stream<Item = Result<T, Status>> + Send + 'static>>;

pub fn test_identity(common_name: &str) -> (CryptoSuite, SigningContext) {
    let suite = CryptoSuite::new(CryptoSuiteOptions::default());
    let key = suite.key_gen();
    let cert_pem = fabric_crypto::dev_self_signed_cert(&key, common_name);
    let identity = Identity::new("peer0", "Org1MSP", Enrollment { cert_pem, key });
    let ctx = SigningContext::bind(identity, &suite).unwrap();
    (suite, ctx)
}

fn tcp_incoming(listener: TcpListener) -> impl Stream<Item = std::io::Result<TcpStream>> {
    stream::unfold(listener, |listener| async {
        let accepted = listener.accept().await.map(|(stream, _addr)| stream);
        Some((accepted, listener))
    })
}

fn envelope_with_tx_id(tx_id: &str) -> Vec<u8> {
    let channel_header = ChannelHeader {
        tx_id: tx_id.to_string(),
        ..Default::default()
    };
    let header = Header {
        channel_header: channel_header.encode_to_vec(),
        signature_header: SignatureHeader::default().encode_to_vec(),
    };
    let payload = Payload {
        header: Some(header),
        data: Vec::new(),
    };
    Envelope {
        payload: payload.encode_to_vec(),
        signature: Vec::new(),
    }
    .encode_to_vec()
}

fn block_with_tx(number: u64, tx_id: &str) -> Block {
    Block {
        header: Some(BlockHeader {
            number,
            previous_hash: Vec::new(),
            data_hash: Vec::new(),
        }),
        data: Some(BlockData {
            data: vec![envelope_with_tx_id(tx_id)],
        }),
        metadata: Some(BlockMetadataContents {
            metadata: vec![Vec::new(), Vec::new(), vec![TxValidationCode::Valid as u8]],
        }),
    }
}

/// Drops its `Deliver` stream after one block on the first connection
/// (forcing a reconnect), then on every later connection skips straight
/// to block 3 — a gap the event hub should warn about, not fail on.
pub struct MockDeliverPeer {
    connection_count: Arc<AtomicU32>,
}

impl MockDeliverPeer {
    pub fn new() -> Self {
        Self {
            connection_count: Arc::new(AtomicU32::new(0)),
        }
    }

    pub async fn serve(self) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            Server::builder()
                .add_service(DeliverServer::new(self))
                .serve_with_incoming(tcp_incoming(listener))
                .await
                .unwrap();
        });
        format!("grpc://{addr}")
    }
}

#[async_trait]
impl Deliver for MockDeliverPeer {
    type DeliverBlocksStream = BoxStream<DeliverResponse>;

    async fn deliver_blocks(
        &self,
        _request: Request<Streaming<Envelope>>,
    ) -> Result<GrpcResponse<Self::DeliverBlocksStream>, Status> {
        let attempt = self.connection_count.fetch_add(1, Ordering::SeqCst);
        let block = if attempt == 0 {
            block_with_tx(1, "tx1")
        } else {
            block_with_tx(3, "tx3")
        };
        let response = DeliverResponse {
            r#type: Some(DeliverResponseType::Block(block)),
        };
        Ok(GrpcResponse::new(Box::pin(stream::once(async { Ok(response) }))))
    }
}
