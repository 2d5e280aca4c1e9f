//! Chain observers (spec §4.2, component C2): follow a source or
//! destination chain, apply finality depth, and emit confirmed
//! `bridge_core::Transfer`s exactly once.
//!
//! This crate owns the chain-facing RPC boundary (`rpc::ChainRpc`, an
//! external collaborator's responsibility to implement) and the scanning
//! state machine (`observer::ChainObserver`). It does not validate transfers
//! against policy, sign anything, or talk to peers — those belong to
//! `bridge-validator`, `bridge-crypto`, and `bridge-aggregator`
//! respectively.

pub mod checkpoint;
pub mod observer;
pub mod rpc;

pub use checkpoint::{InMemoryCheckpoint, ScanCheckpoint};
pub use observer::{ChainObserver, ObservedEvent, ObserverConfig};
pub use rpc::{ChainHead, ChainRpc, ChainRpcError, RawBridgeEvent, SubmissionReceipt};
