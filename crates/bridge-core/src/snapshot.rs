//! `StateSnapshot` (spec §3, §4.6, §9).
//!
//! Open question in spec §9 ("snapshot granularity and the exact set of
//! recoverable states are underspecified"): resolved here as — snapshot the
//! pending-transfer table, per-transfer signature sets, peer directory,
//! nonce table, and open emergency events, nothing else. In particular,
//! executed transfers are not part of the snapshot: the on-chain contract is
//! the source of truth for them (spec §4.5), so re-deriving their state from
//! a snapshot would be redundant and could only introduce drift.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

use crate::emergency::EmergencyEvent;
use crate::peer::ValidatorPeer;
use crate::signature::ValidatorSignature;
use crate::transfer::{ChainId, Direction, Transfer, TransferId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Content hash of everything below, computed by `StateSnapshot::seal`.
    /// Immutable once set — a snapshot is identified by its own content.
    pub content_hash: [u8; 32],
    /// Unix milliseconds.
    pub taken_at: i64,
    pub pending_transfers: Vec<Transfer>,
    pub signature_sets: HashMap<TransferId, Vec<ValidatorSignature>>,
    pub peer_directory: Vec<ValidatorPeer>,
    /// Highest accepted nonce per `(direction, sender_hex)`.
    pub nonce_table: HashMap<(Direction, String), u64>,
    pub open_emergencies: Vec<EmergencyEvent>,
}

impl StateSnapshot {
    pub fn seal(
        taken_at: i64,
        mut pending_transfers: Vec<Transfer>,
        signature_sets: HashMap<TransferId, Vec<ValidatorSignature>>,
        mut peer_directory: Vec<ValidatorPeer>,
        nonce_table: HashMap<(Direction, String), u64>,
        open_emergencies: Vec<EmergencyEvent>,
    ) -> Self {
        // Deterministic ordering so two validators sealing the same logical
        // state at the same instant produce the same content hash.
        pending_transfers.sort_by_key(|t| t.id);
        peer_directory.sort_by(|a, b| a.id.cmp(&b.id));

        let content_hash = Self::compute_hash(taken_at, &pending_transfers, &peer_directory);

        StateSnapshot {
            content_hash,
            taken_at,
            pending_transfers,
            signature_sets,
            peer_directory,
            nonce_table,
            open_emergencies,
        }
    }

    fn compute_hash(taken_at: i64, pending_transfers: &[Transfer], peer_directory: &[ValidatorPeer]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(taken_at.to_le_bytes());
        for t in pending_transfers {
            hasher.update(t.id.0);
        }
        for p in peer_directory {
            hasher.update(p.id.as_bytes());
        }
        let digest = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        out
    }

    pub fn content_hash_hex(&self) -> String {
        hex::encode(self.content_hash)
    }

    /// Which transfer ids from this snapshot should resume signing after a
    /// rollback (spec §4.6): every transfer still present in the pending
    /// table whose deadline has not yet passed.
    pub fn resumable_transfer_ids(&self, now_unix_ms: i64) -> Vec<TransferId> {
        self.pending_transfers
            .iter()
            .filter(|t| !t.is_past_deadline(now_unix_ms))
            .map(|t| t.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::HexBytes;

    fn transfer(log_index: u32) -> Transfer {
        Transfer::new(
            Direction::L1ToL2,
            ChainId(1),
            ChainId(2),
            100,
            HexBytes(vec![0xAB; 20]),
            HexBytes(vec![0xCD; 20]),
            1000,
            HexBytes(vec![0x11; 32]),
            log_index,
            1,
            1_700_000_000_000,
            1_700_000_600_000,
        )
        .unwrap()
    }

    #[test]
    fn identical_state_produces_identical_hash() {
        let a = StateSnapshot::seal(1000, vec![transfer(0)], HashMap::new(), vec![], HashMap::new(), vec![]);
        let b = StateSnapshot::seal(1000, vec![transfer(0)], HashMap::new(), vec![], HashMap::new(), vec![]);
        assert_eq!(a.content_hash, b.content_hash);
    }

    #[test]
    fn resumable_excludes_expired_transfers() {
        let t = transfer(0);
        let deadline = t.deadline;
        let snap = StateSnapshot::seal(1000, vec![t.clone()], HashMap::new(), vec![], HashMap::new(), vec![]);
        assert_eq!(snap.resumable_transfer_ids(deadline).len(), 1);
        assert_eq!(snap.resumable_transfer_ids(deadline + 1).len(), 0);
    }
}
