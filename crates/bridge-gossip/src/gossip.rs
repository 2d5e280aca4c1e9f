//! Peer set plus dedup-and-relay gossip loop (spec §4.4 implementation
//! notes: "`bridge-gossip` owns peer set + seen-message dedup +
//! propagation").

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashSet;
use tokio::sync::mpsc;

use crate::dedup::SeenMessages;
use crate::message::GossipMessage;
use crate::transport::GossipTransport;

pub struct GossipNetwork {
    transport: Arc<dyn GossipTransport>,
    known_peers: DashSet<String>,
    seen: SeenMessages,
}

impl GossipNetwork {
    pub fn new(transport: Arc<dyn GossipTransport>, dedup_retention: Duration) -> Self {
        GossipNetwork {
            transport,
            known_peers: DashSet::new(),
            seen: SeenMessages::new(dedup_retention),
        }
    }

    pub fn add_peer(&self, validator_id: impl Into<String>) {
        self.known_peers.insert(validator_id.into());
    }

    pub fn remove_peer(&self, validator_id: &str) {
        self.known_peers.remove(validator_id);
    }

    pub fn known_peer_count(&self) -> usize {
        self.known_peers.len()
    }

    /// Publishes a message this node originated (e.g. its own local
    /// signature). Always sent, regardless of dedup state — dedup only
    /// governs whether an inbound message gets relayed further.
    pub async fn publish(&self, message: GossipMessage) {
        self.seen.record_if_new(&message.dedup_key());
        if let Err(err) = self.transport.broadcast(&message).await {
            tracing::warn!(error = %err, "gossip publish failed");
        }
    }

    /// Feeds one inbound message through dedup. Returns `Some(message)` the
    /// first time this exact message is seen (caller should both act on it
    /// and, per spec §4.4(c), re-broadcast exactly once); returns `None` on
    /// a repeat delivery (gossip is at-least-once, spec §5).
    pub async fn receive(&self, message: GossipMessage) -> Option<GossipMessage> {
        if !self.seen.record_if_new(&message.dedup_key()) {
            return None;
        }
        if let Err(err) = self.transport.broadcast(&message).await {
            tracing::warn!(error = %err, "gossip relay failed");
        }
        Some(message)
    }

    pub fn evict_expired(&self) {
        self.seen.evict_expired();
    }
}

/// Runs the inbound loop: every message arriving on `inbound` is deduped,
/// relayed once, and — on first sight — forwarded to `consumer_tx` for the
/// rest of the node (`bridge-aggregator` for signatures, `bridge-store` for
/// peer announces and heartbeats) to act on.
pub async fn run_inbound_loop(
    network: Arc<GossipNetwork>,
    mut inbound: mpsc::Receiver<GossipMessage>,
    consumer_tx: mpsc::Sender<GossipMessage>,
) {
    while let Some(message) = inbound.recv().await {
        if let Some(fresh) = network.receive(message).await {
            if consumer_tx.send(fresh).await.is_err() {
                tracing::warn!("gossip consumer channel closed");
                return;
            }
        }
    }
}
