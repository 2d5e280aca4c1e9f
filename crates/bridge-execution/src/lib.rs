//! Consensus & execution (spec §4.5, component C5): re-verify an authorized
//! bundle, construct and submit the destination-chain transaction, and
//! track confirmation through to `Executed` or a bounded-retry failure.

pub mod executor;
pub mod priority;
pub mod tx_builder;
pub mod verify;

pub use executor::{Executor, ExecutorConfig, ExecutionOutcome};
pub use priority::ExecutionQueue;
pub use tx_builder::{ConcatenatedTxBuilder, DestinationTxBuilder};
pub use verify::{verify_bundle, BundleVerificationError};
