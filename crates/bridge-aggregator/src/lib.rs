//! Signature aggregation and threshold sealing (spec §4.4, component C4
//! upper layer). Owns `bridge_core::ValidatorSignature` and is the only
//! crate that touches it directly; `bridge-gossip` below only moves opaque
//! signed bytes between peers.

pub mod aggregator;
pub mod bundle;
pub mod signature_set;

pub use aggregator::{AggregatorConfig, IncomingSignature, SignatureAggregator};
pub use bundle::AuthorizedBundle;
pub use signature_set::{min_safe_threshold, InsertOutcome, TransferSignatureSet};
