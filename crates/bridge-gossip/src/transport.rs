//! Gossip transport: the network seam this crate's peer-set and dedup logic
//! sits on top of. `GossipTransport` is deliberately a narrow trait — the
//! rest of the crate is written against it rather than against libp2p
//! directly, so the peer-set/dedup/propagation logic can be exercised in
//! tests without a real swarm.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::message::GossipMessage;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("gossip transport unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait GossipTransport: Send + Sync {
    async fn broadcast(&self, message: &GossipMessage) -> Result<(), TransportError>;
}

/// libp2p gossipsub-backed transport (spec §4.4: "publishes... to a pub/sub
/// topic"). Construction of the swarm (transport security, peer discovery)
/// is the node binary's job at startup; this type only owns the publish
/// side and the channel the swarm-polling task feeds inbound messages into.
pub struct Libp2pGossipTransport {
    topic: libp2p::gossipsub::IdentTopic,
    publish_tx: mpsc::Sender<Vec<u8>>,
}

impl Libp2pGossipTransport {
    pub fn new(topic_name: &str, publish_tx: mpsc::Sender<Vec<u8>>) -> Self {
        Libp2pGossipTransport {
            topic: libp2p::gossipsub::IdentTopic::new(topic_name),
            publish_tx,
        }
    }

    pub fn topic(&self) -> &libp2p::gossipsub::IdentTopic {
        &self.topic
    }
}

#[async_trait]
impl GossipTransport for Libp2pGossipTransport {
    async fn broadcast(&self, message: &GossipMessage) -> Result<(), TransportError> {
        let bytes = serde_json::to_vec(message)
            .map_err(|e| TransportError::Unavailable(e.to_string()))?;
        self.publish_tx
            .send(bytes)
            .await
            .map_err(|e| TransportError::Unavailable(e.to_string()))
    }
}

/// In-process fan-out transport used by tests and by single-process
/// integration scenarios that simulate several validators without a real
/// network.
pub struct LoopbackTransport {
    peers: tokio::sync::Mutex<Vec<mpsc::Sender<GossipMessage>>>,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        LoopbackTransport { peers: tokio::sync::Mutex::new(Vec::new()) }
    }

    pub async fn connect(&self) -> mpsc::Receiver<GossipMessage> {
        let (tx, rx) = mpsc::channel(256);
        self.peers.lock().await.push(tx);
        rx
    }
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GossipTransport for LoopbackTransport {
    async fn broadcast(&self, message: &GossipMessage) -> Result<(), TransportError> {
        let peers = self.peers.lock().await;
        for peer in peers.iter() {
            let _ = peer.send(message.clone()).await;
        }
        Ok(())
    }
}
