//! `ValidatorSignature` (spec §3).
//!
//! SAFETY INVARIANT: `signature` verifies against `public_key` over the
//! canonical encoding of the referenced transfer; `signed_at <= deadline`.
//! Verification itself lives in `bridge-crypto` (the only crate that knows
//! how to check a signature); this type is just the wire/storage shape.

use serde::{Deserialize, Serialize};

use crate::transfer::TransferId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorSignature {
    pub transfer_id: TransferId,
    pub validator_id: String,
    pub public_key: Vec<u8>,
    pub signature: Vec<u8>,
    /// Unix milliseconds.
    pub signed_at: i64,
    /// SHA-256 of the canonical message this signature was produced over —
    /// carried alongside the signature so a peer can cheaply detect
    /// equivocation (two signatures, same transfer_id, different hash)
    /// without re-verifying every signature first.
    pub message_hash: [u8; 32],
}

impl ValidatorSignature {
    pub fn signed_before_or_at(&self, deadline: i64) -> bool {
        self.signed_at <= deadline
    }

    /// Dedup key for at-least-once gossip delivery (spec §5): a validator
    /// may resend the same signature many times, but it is the same
    /// contribution every time.
    pub fn dedup_key(&self) -> (TransferId, String, [u8; 32]) {
        (self.transfer_id, self.validator_id.clone(), self.message_hash)
    }
}
