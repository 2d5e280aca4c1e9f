//! Collaborator traits the validation pipeline consumes. Each one is a seam:
//! a concrete implementation lives in a different crate (source-proof
//! re-query against `bridge-chain::ChainRpc`, policy/volume state against
//! `bridge-store`, security vetoes against `bridge-failsafe`) so that
//! `bridge-validator` depends on none of them directly.

use async_trait::async_trait;
use bridge_core::{ChainId, Transfer};

#[derive(Debug, thiserror::Error)]
pub enum ProofCheckError {
    #[error("could not reach source chain to confirm proof: {0}")]
    Unreachable(String),
}

/// Re-queries the source chain defensively to confirm a claimed event really
/// exists at the claimed height and log index (spec §4.3 check 3) — this
/// guards against a compromised observer forging events.
#[async_trait]
pub trait SourceProofChecker: Send + Sync {
    async fn confirms(&self, transfer: &Transfer) -> Result<bool, ProofCheckError>;
}

/// Deny lists, circuit breaker volume, and destination pause state (spec
/// §4.3 check 5).
pub trait PolicyStore: Send + Sync {
    fn is_denied(&self, address_hex: &str) -> bool;
    fn is_destination_paused(&self, chain: ChainId) -> bool;
    fn in_flight_volume(&self, chain: ChainId) -> u128;
    fn circuit_breaker_threshold(&self, chain: ChainId) -> u128;
}

/// Running per-sender and per-epoch aggregate volume for amount-policy caps
/// (spec §4.3 check 2).
pub trait VolumeLedger: Send + Sync {
    fn sender_epoch_volume(&self, sender_hex: &str) -> u128;
    fn aggregate_epoch_volume(&self, chain: ChainId) -> u128;
}

/// Whether the failsafe controller currently has an active veto against this
/// sender, recipient, or chain (spec §4.3 check 6).
pub trait SecuritySignals: Send + Sync {
    fn has_active_veto(&self, sender_hex: &str, recipient_hex: &str, chain: ChainId) -> bool;
}
