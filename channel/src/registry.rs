use crate::role::PeerRoles;
use fabric_connection::{OrdererClient, PeerClient};
use fabric_uri::ConnectionUri;
use std::sync::RwLock;

struct RegisteredPeer {
    client: PeerClient,
    roles: PeerRoles,
}

/// The peers and orderers attached to a channel. Guarded by a
/// `RwLock`: adds/removes are rare relative to reads.
#[derive(Default)]
pub struct Registry {
    peers: RwLock<Vec<RegisteredPeer>>,
    orderers: RwLock<Vec<OrdererClient>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_peer(&self, client: PeerClient, roles: PeerRoles) {
        let mut peers = self.peers.write().expect("peer registry lock poisoned");
        peers.retain(|p| p.client.uri().addr() != client.uri().addr());
        peers.push(RegisteredPeer { client, roles });
    }

    pub fn add_orderer(&self, client: OrdererClient) {
        let mut orderers = self.orderers.write().expect("orderer registry lock poisoned");
        orderers.retain(|o| o.uri().addr() != client.uri().addr());
        orderers.push(client);
    }

    pub fn peers_with_role(&self, role: PeerRoles) -> Vec<PeerClient> {
        self.peers
            .read()
            .expect("peer registry lock poisoned")
            .iter()
            .filter(|p| p.roles.contains(role))
            .map(|p| p.client.clone())
            .collect()
    }

    pub fn all_peers(&self) -> Vec<(PeerClient, PeerRoles)> {
        self.peers
            .read()
            .expect("peer registry lock poisoned")
            .iter()
            .map(|p| (p.client.clone(), p.roles))
            .collect()
    }

    pub fn orderers(&self) -> Vec<OrdererClient> {
        self.orderers
            .read()
            .expect("orderer registry lock poisoned")
            .clone()
    }

    pub fn peer_count(&self) -> usize {
        self.peers.read().expect("peer registry lock poisoned").len()
    }

    pub fn orderer_count(&self) -> usize {
        self.orderers
            .read()
            .expect("orderer registry lock poisoned")
            .len()
    }
}
