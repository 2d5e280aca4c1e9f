//! The six-check validation pipeline (spec §4.3). Implemented as an
//! explicit, short-circuiting sequence of functions rather than a
//! `Vec<Box<dyn Check>>` — the set of checks is closed and ordered by
//! protocol, not an open extension point.

use std::sync::Arc;

use bridge_core::{ChainId, RejectionReason, Transfer};

use crate::collaborators::{PolicyStore, SecuritySignals, SourceProofChecker, VolumeLedger};
use crate::replay::AntiReplayTable;

#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    pub min_transfer: u128,
    pub max_transfer: u128,
    pub per_sender_cap: u128,
    pub per_epoch_aggregate_cap: u128,
    /// Expected byte length of a well-formed address on each destination
    /// chain. Most EVM-style chains use 20; this is deliberately per-chain
    /// rather than hardcoded.
    pub expected_address_len: std::collections::HashMap<u64, usize>,
}

impl ValidatorConfig {
    fn address_len_ok(&self, chain: ChainId, len: usize) -> bool {
        match self.expected_address_len.get(&chain.0) {
            Some(expected) => *expected == len,
            None => len > 0,
        }
    }
}

/// Outcome of running the full pipeline over one transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Accepted,
    Rejected(RejectionReason),
}

pub struct EventValidator {
    config: ValidatorConfig,
    replay_table: Arc<AntiReplayTable>,
    source_proof: Arc<dyn SourceProofChecker>,
    policy: Arc<dyn PolicyStore>,
    volume: Arc<dyn VolumeLedger>,
    security: Arc<dyn SecuritySignals>,
}

impl EventValidator {
    pub fn new(
        config: ValidatorConfig,
        replay_table: Arc<AntiReplayTable>,
        source_proof: Arc<dyn SourceProofChecker>,
        policy: Arc<dyn PolicyStore>,
        volume: Arc<dyn VolumeLedger>,
        security: Arc<dyn SecuritySignals>,
    ) -> Self {
        EventValidator { config, replay_table, source_proof, policy, volume, security }
    }

    /// Runs all six checks in order, stopping at the first failure. Only
    /// commits anti-replay state (`AntiReplayTable::record`) once every
    /// check has passed, so a transfer that fails late never poisons the
    /// nonce table against a legitimate retry path.
    pub async fn validate(&self, transfer: &Transfer) -> ValidationOutcome {
        if let Err(reason) = self.check_format(transfer) {
            return ValidationOutcome::Rejected(reason);
        }
        if let Err(reason) = self.check_amount_policy(transfer) {
            return ValidationOutcome::Rejected(reason);
        }
        match self.check_source_proof(transfer).await {
            Ok(()) => {}
            Err(reason) => return ValidationOutcome::Rejected(reason),
        }
        if let Err(reason) = self.check_anti_replay(transfer) {
            return ValidationOutcome::Rejected(reason);
        }
        if let Err(reason) = self.check_risk_policy(transfer) {
            return ValidationOutcome::Rejected(reason);
        }
        if let Err(reason) = self.check_security_signals(transfer) {
            return ValidationOutcome::Rejected(reason);
        }

        self.replay_table.record(transfer);
        ValidationOutcome::Accepted
    }

    /// Check 1: required fields present (enforced at `Transfer` construction
    /// time already), numeric ranges, destination address well-formed.
    fn check_format(&self, transfer: &Transfer) -> Result<(), RejectionReason> {
        if !self.config.address_len_ok(transfer.dest_chain, transfer.recipient.0.len()) {
            return Err(RejectionReason::MalformedFormat);
        }
        Ok(())
    }

    /// Check 2: absolute bounds plus per-sender and per-epoch aggregate caps.
    fn check_amount_policy(&self, transfer: &Transfer) -> Result<(), RejectionReason> {
        if transfer.amount < self.config.min_transfer || transfer.amount > self.config.max_transfer {
            return Err(RejectionReason::AmountOutOfPolicy);
        }

        let sender_hex = transfer.sender.to_hex();
        let projected_sender_volume = self.volume.sender_epoch_volume(&sender_hex) + transfer.amount;
        if projected_sender_volume > self.config.per_sender_cap {
            return Err(RejectionReason::AmountOutOfPolicy);
        }

        let projected_aggregate = self.volume.aggregate_epoch_volume(transfer.dest_chain) + transfer.amount;
        if projected_aggregate > self.config.per_epoch_aggregate_cap {
            return Err(RejectionReason::AmountOutOfPolicy);
        }

        Ok(())
    }

    /// Check 3: defensive re-query of the source chain.
    async fn check_source_proof(&self, transfer: &Transfer) -> Result<(), RejectionReason> {
        match self.source_proof.confirms(transfer).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(RejectionReason::SourceProofInvalid),
            Err(err) => {
                tracing::warn!(transfer_id = %transfer.id, error = %err, "source proof re-query failed, rejecting defensively");
                Err(RejectionReason::SourceProofInvalid)
            }
        }
    }

    /// Check 4: anti-replay (dedup + monotonic nonce).
    fn check_anti_replay(&self, transfer: &Transfer) -> Result<(), RejectionReason> {
        self.replay_table.check(transfer).map_err(Into::into)
    }

    /// Check 5: deny list, circuit breaker, destination pause.
    fn check_risk_policy(&self, transfer: &Transfer) -> Result<(), RejectionReason> {
        if self.policy.is_denied(&transfer.sender.to_hex()) || self.policy.is_denied(&transfer.recipient.to_hex()) {
            return Err(RejectionReason::DenyListed);
        }
        if self.policy.is_destination_paused(transfer.dest_chain) {
            return Err(RejectionReason::DestinationPaused);
        }
        let in_flight = self.policy.in_flight_volume(transfer.dest_chain) + transfer.amount;
        if in_flight > self.policy.circuit_breaker_threshold(transfer.dest_chain) {
            return Err(RejectionReason::CircuitBreakerTripped);
        }
        Ok(())
    }

    /// Check 6: failsafe-controller veto.
    fn check_security_signals(&self, transfer: &Transfer) -> Result<(), RejectionReason> {
        if self.security.has_active_veto(
            &transfer.sender.to_hex(),
            &transfer.recipient.to_hex(),
            transfer.dest_chain,
        ) {
            return Err(RejectionReason::SecurityVeto);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_core::{Direction, HexBytes};
    use std::collections::HashMap;

    struct AlwaysConfirms;
    #[async_trait::async_trait]
    impl SourceProofChecker for AlwaysConfirms {
        async fn confirms(&self, _transfer: &Transfer) -> Result<bool, crate::collaborators::ProofCheckError> {
            Ok(true)
        }
    }

    struct PermissivePolicy;
    impl PolicyStore for PermissivePolicy {
        fn is_denied(&self, _address_hex: &str) -> bool { false }
        fn is_destination_paused(&self, _chain: ChainId) -> bool { false }
        fn in_flight_volume(&self, _chain: ChainId) -> u128 { 0 }
        fn circuit_breaker_threshold(&self, _chain: ChainId) -> u128 { u128::MAX }
    }

    struct EmptyLedger;
    impl VolumeLedger for EmptyLedger {
        fn sender_epoch_volume(&self, _sender_hex: &str) -> u128 { 0 }
        fn aggregate_epoch_volume(&self, _chain: ChainId) -> u128 { 0 }
    }

    struct NoVeto;
    impl SecuritySignals for NoVeto {
        fn has_active_veto(&self, _sender_hex: &str, _recipient_hex: &str, _chain: ChainId) -> bool { false }
    }

    fn validator() -> EventValidator {
        let mut lens = HashMap::new();
        lens.insert(2u64, 20usize);
        EventValidator::new(
            ValidatorConfig {
                min_transfer: 1,
                max_transfer: 1_000_000,
                per_sender_cap: 1_000_000,
                per_epoch_aggregate_cap: 10_000_000,
                expected_address_len: lens,
            },
            Arc::new(AntiReplayTable::new()),
            Arc::new(AlwaysConfirms),
            Arc::new(PermissivePolicy),
            Arc::new(EmptyLedger),
            Arc::new(NoVeto),
        )
    }

    fn sample() -> Transfer {
        Transfer::new(
            Direction::L1ToL2,
            ChainId(1),
            ChainId(2),
            100,
            HexBytes(vec![1; 20]),
            HexBytes(vec![2; 20]),
            1000,
            HexBytes(vec![3; 32]),
            0,
            1,
            1_700_000_000_000,
            1_700_000_600_000,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn accepts_a_well_formed_transfer() {
        let outcome = validator().validate(&sample()).await;
        assert_eq!(outcome, ValidationOutcome::Accepted);
    }

    #[tokio::test]
    async fn rejects_malformed_recipient_length() {
        let mut t = sample();
        t.recipient = HexBytes(vec![2; 19]);
        let outcome = validator().validate(&t).await;
        assert_eq!(outcome, ValidationOutcome::Rejected(RejectionReason::MalformedFormat));
    }

    #[tokio::test]
    async fn rejects_amount_below_minimum() {
        let v = EventValidator::new(
            ValidatorConfig {
                min_transfer: 1000,
                max_transfer: 1_000_000,
                per_sender_cap: 1_000_000,
                per_epoch_aggregate_cap: 10_000_000,
                expected_address_len: HashMap::new(),
            },
            Arc::new(AntiReplayTable::new()),
            Arc::new(AlwaysConfirms),
            Arc::new(PermissivePolicy),
            Arc::new(EmptyLedger),
            Arc::new(NoVeto),
        );
        let outcome = v.validate(&sample()).await;
        assert_eq!(outcome, ValidationOutcome::Rejected(RejectionReason::AmountOutOfPolicy));
    }

    #[tokio::test]
    async fn duplicate_source_event_rejected_on_second_pass() {
        let v = validator();
        assert_eq!(v.validate(&sample()).await, ValidationOutcome::Accepted);
        assert_eq!(v.validate(&sample()).await, ValidationOutcome::Rejected(RejectionReason::Replayed));
    }
}
