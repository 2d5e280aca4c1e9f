//! The `Transfer` data model (spec §3) and the canonical signing encoding
//! (spec §6).
//!
//! SAFETY INVARIANTS:
//! 1. `TransferId` is collision-resistant and deterministic from
//!    `(source_chain, source_tx_hash, source_log_index)`; any two validators
//!    observing the same on-chain event derive the same id.
//! 2. `amount > 0`.
//! 3. `deadline > observed_at`.
//! 4. `canonical_bytes()` is byte-exact and stable: the same `Transfer`
//!    always serializes to the same bytes, on every validator, forever.
//!    Changing the encoding is a breaking protocol change, not a refactor.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::{CoreError, CoreResult};

const FIELD_DELIMITER: u8 = 0x7C; // '|'

/// Chain identifier. Encoded as unsigned decimal in the canonical message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChainId(pub u64);

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Direction of a cross-chain transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    L1ToL2,
    L2ToL1,
}

impl Direction {
    /// Decimal digit used in the canonical encoding. Fixed by protocol, never
    /// renumber an existing variant — it would change every id derived from
    /// a direction-salted encoding downstream.
    fn canonical_digit(self) -> &'static str {
        match self {
            Direction::L1ToL2 => "0",
            Direction::L2ToL1 => "1",
        }
    }
}

/// Raw on-chain address or hash, always rendered lowercase hex with no `0x`
/// prefix in the canonical encoding (spec §6).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HexBytes(pub Vec<u8>);

impl HexBytes {
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Display for HexBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Stable, collision-resistant transfer identifier: `SHA-256(source_chain ||
/// source_tx_hash || source_log_index)` (spec §3). Two validators observing
/// the same on-chain event always derive the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransferId(pub [u8; 32]);

impl TransferId {
    pub fn derive(source_chain: ChainId, source_tx_hash: &HexBytes, source_log_index: u32) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(source_chain.0.to_be_bytes());
        hasher.update(&source_tx_hash.0);
        hasher.update(source_log_index.to_be_bytes());
        let digest = hasher.finalize();
        let mut id = [0u8; 32];
        id.copy_from_slice(&digest);
        TransferId(id)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Lifecycle state of a transfer (spec §3, §4.3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferStatus {
    Pending,
    Validating,
    LocallySigned,
    ThresholdMet,
    Submitted,
    Executed,
    Rejected(RejectionReason),
    Expired,
    EmergencyHold,
}

/// First failing check from the validation pipeline (spec §4.3). Recorded
/// and published so a Byzantine observer cannot silently block a transfer by
/// withholding a rejection reason from peers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionReason {
    MalformedFormat,
    AmountOutOfPolicy,
    SourceProofInvalid,
    Replayed,
    StaleNonce,
    DenyListed,
    CircuitBreakerTripped,
    DestinationPaused,
    SecurityVeto,
}

/// An observed, immutable cross-chain transfer (spec §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: TransferId,
    pub direction: Direction,
    pub source_chain: ChainId,
    pub dest_chain: ChainId,
    pub amount: u128,
    pub sender: HexBytes,
    pub recipient: HexBytes,
    pub source_block_height: u64,
    pub source_tx_hash: HexBytes,
    pub source_log_index: u32,
    pub nonce: u64,
    /// Unix milliseconds.
    pub observed_at: i64,
    /// Unix milliseconds; signing is abandoned once wall-clock passes this.
    pub deadline: i64,
}

impl Transfer {
    /// Construct a transfer, deriving its id and checking the invariants in
    /// spec §3: `amount > 0`, `deadline > observed_at`, non-empty addresses.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        direction: Direction,
        source_chain: ChainId,
        dest_chain: ChainId,
        amount: u128,
        sender: HexBytes,
        recipient: HexBytes,
        source_block_height: u64,
        source_tx_hash: HexBytes,
        source_log_index: u32,
        nonce: u64,
        observed_at: i64,
        deadline: i64,
    ) -> CoreResult<Self> {
        if amount == 0 {
            return Err(CoreError::ZeroAmount);
        }
        if deadline <= observed_at {
            return Err(CoreError::DeadlineNotAfterObserved { observed_at, deadline });
        }
        if sender.0.is_empty() || recipient.0.is_empty() {
            return Err(CoreError::EmptyAddress);
        }
        if source_tx_hash.0.is_empty() {
            return Err(CoreError::EmptyTxHash);
        }

        let id = TransferId::derive(source_chain, &source_tx_hash, source_log_index);

        Ok(Transfer {
            id,
            direction,
            source_chain,
            dest_chain,
            amount,
            sender,
            recipient,
            source_block_height,
            source_tx_hash,
            source_log_index,
            nonce,
            observed_at,
            deadline,
        })
    }

    /// The `(source_chain, source_tx_hash, source_log_index)` anti-replay
    /// key (spec §4.3 check 4).
    pub fn replay_key(&self) -> (ChainId, Vec<u8>, u32) {
        (self.source_chain, self.source_tx_hash.0.clone(), self.source_log_index)
    }

    /// Byte-exact canonical encoding signed by every validator (spec §6):
    ///
    /// ```text
    /// transfer_id | direction | source_chain | dest_chain | amount | sender
    ///   | recipient | nonce | observed_at_unix_ms | source_block_height
    ///   | source_tx_hash
    /// ```
    ///
    /// Numeric fields are decimal with no leading zeros (except the value
    /// zero itself, which cannot occur for `amount` but can for `nonce`).
    /// Hashes and addresses are lowercase hex with no `0x` prefix.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let fields: [String; 11] = [
            self.id.to_hex(),
            self.direction.canonical_digit().to_string(),
            self.source_chain.0.to_string(),
            self.dest_chain.0.to_string(),
            self.amount.to_string(),
            self.sender.to_hex(),
            self.recipient.to_hex(),
            self.nonce.to_string(),
            self.observed_at.to_string(),
            self.source_block_height.to_string(),
            self.source_tx_hash.to_hex(),
        ];

        let mut bytes = Vec::new();
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                bytes.push(FIELD_DELIMITER);
            }
            bytes.extend_from_slice(field.as_bytes());
        }
        bytes
    }

    /// SHA-256 of `canonical_bytes()` — the hash every validator signature is
    /// taken over.
    pub fn canonical_hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical_bytes());
        let digest = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        out
    }

    pub fn is_past_deadline(&self, now_unix_ms: i64) -> bool {
        now_unix_ms > self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Transfer {
        Transfer::new(
            Direction::L1ToL2,
            ChainId(1),
            ChainId(2),
            100,
            HexBytes(vec![0xAB; 20]),
            HexBytes(vec![0xCD; 20]),
            1000,
            HexBytes(vec![0x11; 32]),
            0,
            1,
            1_700_000_000_000,
            1_700_000_600_000,
        )
        .unwrap()
    }

    #[test]
    fn same_event_yields_same_id() {
        let a = sample();
        let b = sample();
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn different_log_index_yields_different_id() {
        let a = sample();
        let mut b = sample();
        b.source_log_index = 1;
        // id is derived at construction time from the args passed to new(),
        // so re-derive explicitly here to mirror what an observer would do.
        let b_id = TransferId::derive(b.source_chain, &b.source_tx_hash, 1);
        assert_ne!(a.id, b_id);
    }

    #[test]
    fn rejects_zero_amount() {
        let err = Transfer::new(
            Direction::L1ToL2,
            ChainId(1),
            ChainId(2),
            0,
            HexBytes(vec![0xAB; 20]),
            HexBytes(vec![0xCD; 20]),
            1000,
            HexBytes(vec![0x11; 32]),
            0,
            1,
            1_700_000_000_000,
            1_700_000_600_000,
        )
        .unwrap_err();
        assert_eq!(err, CoreError::ZeroAmount);
    }

    #[test]
    fn rejects_deadline_before_observed_at() {
        let err = Transfer::new(
            Direction::L1ToL2,
            ChainId(1),
            ChainId(2),
            100,
            HexBytes(vec![0xAB; 20]),
            HexBytes(vec![0xCD; 20]),
            1000,
            HexBytes(vec![0x11; 32]),
            0,
            1,
            1_700_000_600_000,
            1_700_000_000_000,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::DeadlineNotAfterObserved { .. }));
    }

    #[test]
    fn canonical_bytes_are_stable() {
        let t = sample();
        let first = t.canonical_bytes();
        let second = t.canonical_bytes();
        assert_eq!(first, second);
        assert!(first.iter().filter(|&&b| b == FIELD_DELIMITER).count() == 10);
    }

    #[test]
    fn canonical_hash_changes_with_amount() {
        let a = sample();
        let mut b = sample();
        b.amount = 200;
        assert_ne!(a.canonical_hash(), b.canonical_hash());
    }

    #[test]
    fn past_deadline_detection() {
        let t = sample();
        assert!(!t.is_past_deadline(t.deadline));
        assert!(t.is_past_deadline(t.deadline + 1));
    }
}
