//! Wire messages exchanged over the gossip topic (spec §6: peer directory
//! entry, heartbeat, signature broadcast).
//!
//! `bridge-gossip` moves these as opaque, already-signed payloads — it
//! never inspects a `ValidatorSignature` or decides threshold sealing, that
//! stays in `bridge-aggregator` (spec §4.4 implementation notes: "built in
//! two layers").

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureBroadcast {
    pub transfer_id: String,
    pub validator_id: String,
    pub public_key: String,
    pub signature: String,
    pub message_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerAnnounce {
    pub validator_id: String,
    pub public_key: String,
    pub endpoint: String,
    pub declared_stake: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Heartbeat {
    pub validator_id: String,
    pub sent_at: i64,
    pub round_index: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GossipMessage {
    Signature(SignatureBroadcast),
    PeerAnnounce(PeerAnnounce),
    Heartbeat(Heartbeat),
}

impl GossipMessage {
    /// Dedup identity for at-least-once delivery (spec §5: "deduplication is
    /// by `(transfer_id, validator_id, message_hash)` triple"; heartbeats and
    /// peer announces use their own natural keys since they carry no
    /// transfer id).
    pub fn dedup_key(&self) -> String {
        match self {
            GossipMessage::Signature(s) => format!("sig:{}:{}:{}", s.transfer_id, s.validator_id, s.message_hash),
            GossipMessage::PeerAnnounce(p) => format!("peer:{}:{}", p.validator_id, p.endpoint),
            GossipMessage::Heartbeat(h) => format!("hb:{}:{}", h.validator_id, h.sent_at),
        }
    }
}
