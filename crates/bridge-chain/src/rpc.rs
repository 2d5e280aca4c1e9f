//! RPC boundary to a single chain (spec §1: "The spec assumes collaborators
//! provide: an RPC client per chain exposing `get_latest_block`,
//! `scan_events(from,to)`, `submit_signed_transaction`").
//!
//! This crate never implements a concrete chain client — that is an
//! external collaborator per spec §1. `ChainRpc` is the seam a real
//! Ethereum/Substrate/etc. client plugs into.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainHead {
    pub height: u64,
    pub hash: Vec<u8>,
}

/// A bridge-relevant event as scanned off-chain, before it becomes a
/// `bridge_core::Transfer`. The observer is responsible for turning this
/// into a `Transfer` with a derived id (spec §4.2 step 4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBridgeEvent {
    pub tx_hash: Vec<u8>,
    pub log_index: u32,
    pub block_height: u64,
    pub sender: Vec<u8>,
    pub recipient: Vec<u8>,
    pub amount: u128,
    pub nonce: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub tx_hash: Vec<u8>,
    pub included_at_height: Option<u64>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChainRpcError {
    #[error("chain RPC unreachable: {0}")]
    Unreachable(String),

    #[error("chain RPC timed out")]
    Timeout,

    #[error("chain RPC returned an unexpected response: {0}")]
    Protocol(String),
}

/// Per-chain RPC client contract (spec §1, §4.2, §4.5). Implemented by an
/// external collaborator for each concrete chain; `bridge-chain` only
/// consumes this trait.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    async fn get_latest_block(&self) -> Result<ChainHead, ChainRpcError>;

    /// The block hash at `height`, used for reorg detection (spec §4.2).
    async fn block_hash_at(&self, height: u64) -> Result<Vec<u8>, ChainRpcError>;

    /// Scan `(from, to]` for bridge-relevant events, in the caller's chosen
    /// batch bounds.
    async fn scan_events(&self, from: u64, to: u64) -> Result<Vec<RawBridgeEvent>, ChainRpcError>;

    async fn submit_signed_transaction(&self, payload: &[u8]) -> Result<SubmissionReceipt, ChainRpcError>;
}
