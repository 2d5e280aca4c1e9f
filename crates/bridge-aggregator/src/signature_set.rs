//! Per-transfer signature bookkeeping (spec §4.4): one slot per validator,
//! equivocation detection, and threshold sealing over the *same* canonical
//! message.

use std::collections::HashMap;

use bridge_core::{Transfer, TransferId, ValidatorSignature};

/// Minimum `t` for Byzantine safety given `n` validators: `t >= ceil(2n/3)+1`
/// (spec §4.4).
pub fn min_safe_threshold(total_validators: usize) -> usize {
    (2 * total_validators).div_ceil(3) + 1
}

#[derive(Debug)]
pub enum InsertOutcome {
    /// Recorded; threshold not yet reached.
    Recorded,
    /// Already had this exact `(validator_id, message_hash)` pair; ignored.
    Duplicate,
    /// The signature's message hash does not match this validator's local
    /// view of the transfer. Rejected; caller should report to failsafe.
    CanonicalMismatch,
    /// This validator had already signed a *different* message hash for the
    /// same transfer id — equivocation. The validator's prior signature is
    /// purged from the set.
    Equivocation { validator_id: String },
    /// This insertion brought the set to `>= threshold` distinct validators
    /// over the same message hash; the set is sealed and should not accept
    /// further insertions.
    Sealed(Vec<ValidatorSignature>),
}

pub struct TransferSignatureSet {
    transfer: Transfer,
    local_canonical_hash: [u8; 32],
    by_validator: HashMap<String, ValidatorSignature>,
    isolated: std::collections::HashSet<String>,
    sealed: bool,
}

impl TransferSignatureSet {
    pub fn new(transfer: Transfer) -> Self {
        let local_canonical_hash = transfer.canonical_hash();
        TransferSignatureSet {
            transfer,
            local_canonical_hash,
            by_validator: HashMap::new(),
            isolated: std::collections::HashSet::new(),
            sealed: false,
        }
    }

    pub fn transfer(&self) -> &Transfer {
        &self.transfer
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Inserts a signature (local or peer-sourced) after the caller has
    /// already verified the cryptographic signature itself against
    /// `signature.public_key`. This function only handles the protocol-level
    /// bookkeeping: canonical-message agreement, equivocation, and
    /// threshold sealing.
    pub fn insert(&mut self, signature: ValidatorSignature, threshold: usize) -> InsertOutcome {
        if self.sealed {
            return InsertOutcome::Duplicate;
        }
        if self.isolated.contains(&signature.validator_id) {
            return InsertOutcome::Duplicate;
        }
        if signature.message_hash != self.local_canonical_hash {
            return InsertOutcome::CanonicalMismatch;
        }

        if let Some(existing) = self.by_validator.get(&signature.validator_id) {
            if existing.message_hash == signature.message_hash {
                return InsertOutcome::Duplicate;
            }
        }

        self.by_validator.insert(signature.validator_id.clone(), signature);

        if self.by_validator.len() >= threshold {
            self.sealed = true;
            return InsertOutcome::Sealed(self.by_validator.values().cloned().collect());
        }
        InsertOutcome::Recorded
    }

    /// A peer broadcast a signature whose message hash does not match the
    /// hash we already hold on file for that same validator — a direct
    /// equivocation (spec §4.4(a), Byzantine double-sign scenario). Purges
    /// the validator's prior contribution and isolates it from this set.
    pub fn isolate_equivocating_validator(&mut self, validator_id: &str) {
        self.by_validator.remove(validator_id);
        self.isolated.insert(validator_id.to_string());
    }

    pub fn has_signature_from(&self, validator_id: &str) -> Option<&ValidatorSignature> {
        self.by_validator.get(validator_id)
    }

    pub fn id(&self) -> TransferId {
        self.transfer.id
    }
}
