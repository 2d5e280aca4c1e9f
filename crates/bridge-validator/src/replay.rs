//! Anti-replay state (spec §4.3 check 4): a deduplication set keyed by
//! `(source_chain, source_tx_hash, source_log_index)` and a monotonic nonce
//! high-water mark per `(direction, sender)`.
//!
//! Retention: entries are never evicted here on a timer. The table's
//! lifetime is bounded by the node process; a real deployment persists it
//! in `bridge-store` with a retention window at least as long as the
//! transfer deadline plus the emergency rollback horizon (spec §4.3), which
//! is where eviction policy belongs, not in this in-memory view.

use bridge_core::{ChainId, Direction, Transfer, TransferStatus};
use dashmap::{DashMap, DashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayRejection {
    Replayed,
    StaleNonce,
}

impl From<ReplayRejection> for bridge_core::RejectionReason {
    fn from(r: ReplayRejection) -> Self {
        match r {
            ReplayRejection::Replayed => bridge_core::RejectionReason::Replayed,
            ReplayRejection::StaleNonce => bridge_core::RejectionReason::StaleNonce,
        }
    }
}

#[derive(Default)]
pub struct AntiReplayTable {
    seen_sources: DashSet<(ChainId, Vec<u8>, u32)>,
    nonce_high_water: DashMap<(Direction, Vec<u8>), u64>,
}

impl AntiReplayTable {
    pub fn new() -> Self {
        AntiReplayTable::default()
    }

    /// Checks without mutating. Call `record` only after every later check
    /// in the pipeline also passes, so a transfer rejected downstream never
    /// poisons the nonce table (spec's never-resign-only-regossip Open
    /// Question is about signatures, not this table, but the same
    /// side-effect-only-on-commit discipline applies here).
    pub fn check(&self, transfer: &Transfer) -> Result<(), ReplayRejection> {
        let source_key = transfer.replay_key();
        if self.seen_sources.contains(&source_key) {
            return Err(ReplayRejection::Replayed);
        }

        let nonce_key = (transfer.direction, transfer.sender.0.clone());
        if let Some(high) = self.nonce_high_water.get(&nonce_key) {
            if transfer.nonce <= *high {
                return Err(ReplayRejection::StaleNonce);
            }
        }
        Ok(())
    }

    pub fn record(&self, transfer: &Transfer) {
        self.seen_sources.insert(transfer.replay_key());
        let nonce_key = (transfer.direction, transfer.sender.0.clone());
        self.nonce_high_water
            .entry(nonce_key)
            .and_modify(|v| *v = (*v).max(transfer.nonce))
            .or_insert(transfer.nonce);
    }
}

/// Convenience used by the pipeline: a transfer only ever reaches
/// `TransferStatus::Validating` once, never re-queued through the same
/// table twice with a different outcome.
pub fn initial_status() -> TransferStatus {
    TransferStatus::Pending
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_core::HexBytes;

    fn transfer(tx_hash: u8, nonce: u64) -> Transfer {
        Transfer::new(
            Direction::L1ToL2,
            ChainId(1),
            ChainId(2),
            100,
            HexBytes(vec![9; 20]),
            HexBytes(vec![8; 20]),
            1000,
            HexBytes(vec![tx_hash; 32]),
            0,
            nonce,
            1_700_000_000_000,
            1_700_000_600_000,
        )
        .unwrap()
    }

    #[test]
    fn rejects_exact_duplicate_source_event() {
        let table = AntiReplayTable::new();
        let t = transfer(1, 5);
        table.check(&t).unwrap();
        table.record(&t);
        assert_eq!(table.check(&t).unwrap_err(), ReplayRejection::Replayed);
    }

    #[test]
    fn rejects_non_increasing_nonce() {
        let table = AntiReplayTable::new();
        let first = transfer(1, 5);
        table.check(&first).unwrap();
        table.record(&first);

        let replay_nonce = transfer(2, 5);
        assert_eq!(table.check(&replay_nonce).unwrap_err(), ReplayRejection::StaleNonce);

        let higher_nonce = transfer(3, 6);
        assert!(table.check(&higher_nonce).is_ok());
    }
}
