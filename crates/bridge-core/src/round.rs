//! `ConsensusRound` (spec §3).
//!
//! A logical round index incremented on each peer-sync tick, used for gossip
//! correlation only — safety comes from the signature threshold, never from
//! the round number, so this type carries no safety-relevant logic.

use serde::{Deserialize, Serialize};

use crate::transfer::TransferId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusRound {
    pub index: u64,
    pub pending_transfer_ids: Vec<TransferId>,
    pub known_peer_ids: Vec<String>,
}

impl ConsensusRound {
    pub fn genesis() -> Self {
        ConsensusRound {
            index: 0,
            pending_transfer_ids: Vec::new(),
            known_peer_ids: Vec::new(),
        }
    }

    pub fn next(&self, pending_transfer_ids: Vec<TransferId>, known_peer_ids: Vec<String>) -> Self {
        ConsensusRound {
            index: self.index + 1,
            pending_transfer_ids,
            known_peer_ids,
        }
    }
}
