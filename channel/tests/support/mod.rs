//! Mock gRPC peer/orderer used by the integration tests in this
//! directory: enough of `Endorser`/`Deliver`/`AtomicBroadcast` to drive
//! a `Channel` through propose -> endorse -> order -> commit without a
//! real Fabric network.

use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use fabric_crypto::{CryptoSuite, CryptoSuiteOptions};
use fabric_identity::{Enrollment, Identity, SigningContext};
use fabric_protos::common::{
    Block, BlockData, BlockHeader, BlockMetadataContents, ChannelHeader, Envelope, Header, Payload,
    SignatureHeader, TxValidationCode,
};
use fabric_protos::protos::atomic_broadcast_server::{AtomicBroadcast, AtomicBroadcastServer};
use fabric_protos::protos::deliver_response::Type as DeliverResponseType;
use fabric_protos::protos::deliver_server::{Deliver, DeliverServer};
use fabric_protos::protos::endorser_server::{Endorser, EndorserServer};
use fabric_protos::protos::{
    BroadcastResponse, BroadcastStatusCode, DeliverResponse, Endorsement, Proposal,
    ProposalResponse, Response, SignedProposal,
};
use futures::stream::{self, Stream};
use prost::Message;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tonic::transport::Server;
use tonic::{async_trait, Request, Response as GrpcResponse, Status, Streaming};

pub type BoxStream<T> = Pin<Box<dyn Stream<Item = Result<T, Status>> + Send + 'static>>;

/// A throwaway admin identity, bound against a freshly generated key
/// and self-signed certificate.
pub fn test_identity(common_name: &str) -> (CryptoSuite, SigningContext) {
    let suite = CryptoSuite::new(CryptoSuiteOptions::default());
    let key = suite.key_gen();
    let cert_pem = fabric_crypto::dev_self_signed_cert(&key, common_name);
    let identity = Identity::new("admin", "Org1MSP", Enrollment { cert_pem, key });
    let ctx = SigningContext::bind(identity, &suite).unwrap();
    (suite, ctx)
}

fn tcp_incoming(listener: TcpListener) -> impl Stream<Item = std::io::Result<TcpStream>> {
    stream::unfold(listener, |listener| async {
        let accepted = listener.accept().await.map(|(stream, _addr)| stream);
        Some((accepted, listener))
    })
}

fn encode_envelope_for_tx(tx_id: &str) -> Vec<u8> {
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

fn committed_block(number: u64, tx_id: &str) -> Block {
    Block {
        header: Some(BlockHeader {
            number,
            previous_hash: Vec::new(),
            data_hash: Vec::new(),
        }),
        data: Some(BlockData {
            data: vec![encode_envelope_for_tx(tx_id)],
        }),
        metadata: Some(BlockMetadataContents {
            metadata: vec![Vec::new(), Vec::new(), vec![TxValidationCode::Valid as u8]],
        }),
    }
}

fn block_stream(mut rx: mpsc::UnboundedReceiver<Block>) -> BoxStream<DeliverResponse> {
    Box::pin(stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|block| {
            let response = DeliverResponse {
                r#type: Some(DeliverResponseType::Block(block)),
            };
            (Ok(response), rx)
        })
    }))
}

struct MockPeerInner {
    blocks_tx: mpsc::UnboundedSender<Block>,
    // Only one `Deliver` subscriber is expected per test; the receiver
    // is handed out to whichever connection asks for it first.
    blocks_rx: AsyncMutex<Option<mpsc::UnboundedReceiver<Block>>>,
    next_block: AtomicU64,
    commit_transactions: bool,
}

/// A single endorsing/event-source peer: endorses every proposal with
/// status 200 and, unless built with `commit_transactions: false`,
/// announces the transaction committed on its `Deliver` stream right
/// after endorsing it. Blocks are queued on an mpsc channel rather than
/// broadcast so that an endorsement racing ahead of the event hub's
/// subscription is never silently dropped.
#[derive(Clone)]
pub struct MockPeer {
    inner: Arc<MockPeerInner>,
}

impl MockPeer {
    pub fn new(commit_transactions: bool) -> Self {
        let (blocks_tx, blocks_rx) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(MockPeerInner {
                blocks_tx,
                blocks_rx: AsyncMutex::new(Some(blocks_rx)),
                next_block: AtomicU64::new(1),
                commit_transactions,
            }),
        }
    }

    /// Bind an ephemeral port, serve `Endorser` + `Deliver` on it in
    /// the background, and return the `grpc://` URL to connect to.
    pub async fn serve(self) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            Server::builder()
                .add_service(EndorserServer::new(self.clone()))
                .add_service(DeliverServer::new(self))
                .serve_with_incoming(tcp_incoming(listener))
                .await
                .unwrap();
        });
        format!("grpc://{addr}")
    }
}

#[async_trait]
impl Endorser for MockPeer {
    async fn process_proposal(
        &self,
        request: Request<SignedProposal>,
    ) -> Result<GrpcResponse<ProposalResponse>, Status> {
        let signed = request.into_inner();
        let proposal = Proposal::decode(signed.proposal_bytes.as_slice())
            .map_err(|e| Status::invalid_argument(e.to_string()))?;
        let header = Header::decode(proposal.header.as_slice())
            .map_err(|e| Status::invalid_argument(e.to_string()))?;
        let channel_header = ChannelHeader::decode(header.channel_header.as_slice())
            .map_err(|e| Status::invalid_argument(e.to_string()))?;

        if self.inner.commit_transactions {
            let number = self.inner.next_block.fetch_add(1, Ordering::SeqCst);
            let _ = self
                .inner
                .blocks_tx
                .send(committed_block(number, &channel_header.tx_id));
        }

        let response = ProposalResponse {
            version: 1,
            validation_code: TxValidationCode::Valid as i32,
            response: Some(Response {
                status: 200,
                message: String::new(),
                payload: Vec::new(),
            }),
            payload: b"mock-rwset".to_vec(),
            endorsement: Some(Endorsement {
                endorser: b"mockpeer".to_vec(),
                signature: b"mock-signature".to_vec(),
            }),
        };
        Ok(GrpcResponse::new(response))
    }
}

#[async_trait]
impl Deliver for MockPeer {
    type DeliverBlocksStream = BoxStream<DeliverResponse>;

    async fn deliver_blocks(
        &self,
        _request: Request<Streaming<Envelope>>,
    ) -> Result<GrpcResponse<Self::DeliverBlocksStream>, Status> {
        let rx = self
            .inner
            .blocks_rx
            .lock()
            .await
            .take()
            .expect("only one Deliver subscriber is expected in these tests");
        Ok(GrpcResponse::new(block_stream(rx)))
    }
}

struct MockOrdererInner {
    status: BroadcastStatusCode,
}

/// An ordering node that accepts every broadcast with a fixed status
/// and answers config-block reads with one empty block.
#[derive(Clone)]
pub struct MockOrderer {
    inner: Arc<MockOrdererInner>,
}

impl MockOrderer {
    pub fn new(status: BroadcastStatusCode) -> Self {
        Self {
            inner: Arc::new(MockOrdererInner { status }),
        }
    }

    pub async fn serve(self) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            Server::builder()
                .add_service(AtomicBroadcastServer::new(self))
                .serve_with_incoming(tcp_incoming(listener))
                .await
                .unwrap();
        });
        format!("grpc://{addr}")
    }
}

#[async_trait]
impl AtomicBroadcast for MockOrderer {
    type BroadcastStream = BoxStream<BroadcastResponse>;
    type DeliverBlocksStream = BoxStream<DeliverResponse>;

    async fn broadcast(
        &self,
        _request: Request<Streaming<Envelope>>,
    ) -> Result<GrpcResponse<Self::BroadcastStream>, Status> {
        let status = self.inner.status;
        let stream = stream::once(async move {
            Ok(BroadcastResponse {
                status: status as i32,
                info: String::new(),
            })
        });
        Ok(GrpcResponse::new(Box::pin(stream)))
    }

    async fn deliver_blocks(
        &self,
        _request: Request<Streaming<Envelope>>,
    ) -> Result<GrpcResponse<Self::DeliverBlocksStream>, Status> {
        let block = Block {
            header: Some(BlockHeader::default()),
            data: Some(BlockData::default()),
            metadata: Some(BlockMetadataContents {
                metadata: vec![Vec::new(), Vec::new(), Vec::new()],
            }),
        };
        let stream = stream::once(async move {
            Ok(DeliverResponse {
                r#type: Some(DeliverResponseType::Block(block)),
            })
        });
        Ok(GrpcResponse::new(Box::pin(stream)))
    }
}
