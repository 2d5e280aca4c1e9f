//! Destination transaction construction (spec §4.5 step 2: "exact format
//! defined by the on-chain contract, an external collaborator"). This crate
//! only defines the seam; the concrete encoding for a given destination
//! chain's bridge contract is supplied by the node binary at construction
//! time.

use bridge_aggregator::AuthorizedBundle;

pub trait DestinationTxBuilder: Send + Sync {
    /// Serializes a sealed bundle into whatever payload
    /// `ChainRpc::submit_signed_transaction` expects for this destination
    /// chain's bridge contract.
    fn build(&self, bundle: &AuthorizedBundle) -> Vec<u8>;
}

/// A builder that concatenates the canonical transfer bytes with each
/// signature, in validator-id order, for contracts that accept a raw
/// multi-signature blob. Chains with a richer ABI (e.g. an EVM contract
/// expecting `(transfer, sig[])` calldata) supply their own
/// `DestinationTxBuilder` instead.
pub struct ConcatenatedTxBuilder;

impl DestinationTxBuilder for ConcatenatedTxBuilder {
    fn build(&self, bundle: &AuthorizedBundle) -> Vec<u8> {
        let mut payload = bundle.transfer.canonical_bytes();
        let mut signatures = bundle.signatures.clone();
        signatures.sort_by(|a, b| a.validator_id.cmp(&b.validator_id));
        for sig in &signatures {
            payload.extend_from_slice(sig.validator_id.as_bytes());
            payload.extend_from_slice(&sig.signature);
        }
        payload
    }
}
