//! Signature aggregation task (spec §4.4, component C4 upper layer).
//!
//! Consumes incoming signatures — local (from `bridge-crypto`) and
//! peer-sourced (relayed by `bridge-gossip`) — keyed by transfer id, detects
//! equivocation, and emits a sealed `AuthorizedBundle` to C5 the moment a
//! transfer's signature set reaches `threshold`.

use std::sync::Arc;

use bridge_core::{HealthEvent, Transfer, TransferId, ValidatorSignature};
use bridge_crypto::Keystore;
use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::bundle::AuthorizedBundle;
use crate::signature_set::{min_safe_threshold, InsertOutcome, TransferSignatureSet};

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub threshold: usize,
    pub total_validators: usize,
}

impl AggregatorConfig {
    /// Per spec §4.4: `t >= ceil(2n/3)+1` for Byzantine safety; below that,
    /// the aggregator still runs (refusing to start over this belongs to
    /// `bridge-config` at process startup) but logs a standing warning on
    /// every tick.
    pub fn is_byzantine_safe(&self) -> bool {
        self.threshold >= min_safe_threshold(self.total_validators)
    }
}

/// An incoming signature to fold into its transfer's set, tagged with the
/// locally-observed `Transfer` the first time the set is created.
pub struct IncomingSignature {
    pub transfer: Transfer,
    pub signature: ValidatorSignature,
}

pub struct SignatureAggregator {
    config: AggregatorConfig,
    sets: DashMap<TransferId, TransferSignatureSet>,
    /// First message hash ever seen from each `(transfer_id, validator_id)`
    /// pair, tracked independently of our own local canonical view, so that
    /// true double-signing is caught even when our local observation lags
    /// or differs transiently (spec §4.4(a), Byzantine double-sign scenario).
    first_hash_seen: DashMap<(TransferId, String), [u8; 32]>,
    health_tx: mpsc::Sender<HealthEvent>,
    sealed_tx: mpsc::Sender<AuthorizedBundle>,
}

impl SignatureAggregator {
    pub fn new(
        config: AggregatorConfig,
        health_tx: mpsc::Sender<HealthEvent>,
        sealed_tx: mpsc::Sender<AuthorizedBundle>,
    ) -> Self {
        if !config.is_byzantine_safe() {
            tracing::warn!(
                threshold = config.threshold,
                total_validators = config.total_validators,
                minimum_safe = min_safe_threshold(config.total_validators),
                "configured threshold is below the Byzantine safety floor"
            );
        }
        SignatureAggregator {
            config,
            sets: DashMap::new(),
            first_hash_seen: DashMap::new(),
            health_tx,
            sealed_tx,
        }
    }

    /// Folds one signature into its transfer's set. `public_key` ownership
    /// of the signature is verified against the wire bytes here, before any
    /// protocol-level bookkeeping, using the same `Keystore::verify` used
    /// for local signing so peer and local paths share one trust check.
    pub async fn ingest(&self, incoming: IncomingSignature) {
        let IncomingSignature { transfer, signature } = incoming;

        if !bridge_crypto::Ed25519Keystore::verify(
            &signature.public_key,
            &signature.message_hash,
            &signature.signature,
        ) {
            tracing::warn!(validator_id = %signature.validator_id, transfer_id = %transfer.id, "dropping signature with invalid cryptographic signature");
            return;
        }

        let equivocation_key = (transfer.id, signature.validator_id.clone());
        let is_equivocation = match self.first_hash_seen.get(&equivocation_key) {
            Some(first) => *first != signature.message_hash,
            None => {
                self.first_hash_seen.insert(equivocation_key, signature.message_hash);
                false
            }
        };

        if is_equivocation {
            tracing::warn!(validator_id = %signature.validator_id, transfer_id = %transfer.id, "equivocation detected: validator signed two distinct messages for the same transfer");
            if let Some(mut set) = self.sets.get_mut(&transfer.id) {
                set.isolate_equivocating_validator(&signature.validator_id);
            }
            let _ = self.health_tx.send(HealthEvent::Equivocation {
                validator_id: signature.validator_id.clone(),
                transfer_id: transfer.id.to_hex(),
            }).await;
            return;
        }

        let mut entry = self.sets.entry(transfer.id).or_insert_with(|| TransferSignatureSet::new(transfer));

        match entry.insert(signature.clone(), self.config.threshold) {
            InsertOutcome::Recorded | InsertOutcome::Duplicate => {}
            InsertOutcome::CanonicalMismatch => {
                tracing::warn!(validator_id = %signature.validator_id, transfer_id = %signature.transfer_id, "signature message hash does not match local canonical view");
                let _ = self.health_tx.send(HealthEvent::Equivocation {
                    validator_id: signature.validator_id.clone(),
                    transfer_id: signature.transfer_id.to_hex(),
                }).await;
            }
            InsertOutcome::Equivocation { validator_id } => {
                let _ = self.health_tx.send(HealthEvent::Equivocation {
                    validator_id,
                    transfer_id: signature.transfer_id.to_hex(),
                }).await;
            }
            InsertOutcome::Sealed(signatures) => {
                let transfer = entry.transfer().clone();
                drop(entry);
                tracing::info!(transfer_id = %transfer.id, signature_count = signatures.len(), "threshold reached, sealing bundle");
                let bundle = AuthorizedBundle { transfer, signatures };
                if self.sealed_tx.send(bundle).await.is_err() {
                    tracing::warn!("sealed-bundle channel closed, dropping authorized bundle");
                }
            }
        }
    }

    pub fn is_sealed(&self, transfer_id: TransferId) -> bool {
        self.sets.get(&transfer_id).map(|s| s.is_sealed()).unwrap_or(false)
    }
}

/// Spawns the aggregator as a long-lived task consuming `incoming` until the
/// channel closes.
pub async fn run(aggregator: Arc<SignatureAggregator>, mut incoming: mpsc::Receiver<IncomingSignature>) {
    while let Some(item) = incoming.recv().await {
        aggregator.ingest(item).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_core::{ChainId, Direction, HexBytes};
    use bridge_crypto::Ed25519Keystore;
    use rand::rngs::OsRng;

    fn sample_transfer() -> Transfer {
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

    fn sign_transfer(transfer: &Transfer, validator_id: &str) -> ValidatorSignature {
        let keystore = Ed25519Keystore::generate(&mut OsRng);
        let message_hash = transfer.canonical_hash();
        let sig_bytes = keystore.sign(&message_hash);
        ValidatorSignature {
            transfer_id: transfer.id,
            validator_id: validator_id.to_string(),
            public_key: keystore.public_key(),
            signature: sig_bytes,
            signed_at: 1_700_000_001_000,
            message_hash,
        }
    }

    #[tokio::test]
    async fn seals_once_threshold_reached() {
        let (health_tx, _health_rx) = mpsc::channel(16);
        let (sealed_tx, mut sealed_rx) = mpsc::channel(16);
        let aggregator = Arc::new(SignatureAggregator::new(
            AggregatorConfig { threshold: 2, total_validators: 3 },
            health_tx,
            sealed_tx,
        ));

        let transfer = sample_transfer();
        for id in ["v1", "v2"] {
            let sig = sign_transfer(&transfer, id);
            aggregator.ingest(IncomingSignature { transfer: transfer.clone(), signature: sig }).await;
        }

        let bundle = sealed_rx.recv().await.unwrap();
        assert_eq!(bundle.signatures.len(), 2);
        assert!(aggregator.is_sealed(transfer.id));
    }

    #[tokio::test]
    async fn detects_equivocation_across_two_transfers() {
        let (health_tx, mut health_rx) = mpsc::channel(16);
        let (sealed_tx, _sealed_rx) = mpsc::channel(16);
        let aggregator = Arc::new(SignatureAggregator::new(
            AggregatorConfig { threshold: 5, total_validators: 3 },
            health_tx,
            sealed_tx,
        ));

        let transfer = sample_transfer();
        let mut conflicting = transfer.clone();
        conflicting.amount = 999_999;

        let first = sign_transfer(&transfer, "v3");
        aggregator.ingest(IncomingSignature { transfer: transfer.clone(), signature: first }).await;

        let mut second = sign_transfer(&conflicting, "v3");
        second.transfer_id = transfer.id;
        aggregator.ingest(IncomingSignature { transfer: transfer.clone(), signature: second }).await;

        let event = health_rx.recv().await.unwrap();
        assert!(matches!(event, HealthEvent::Equivocation { validator_id, .. } if validator_id == "v3"));
    }
}
