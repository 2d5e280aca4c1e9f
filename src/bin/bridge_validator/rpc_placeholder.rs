//! Minimal `ChainRpc` implementation used until an operator wires in a real
//! chain client (spec.md §1: "an RPC client per chain... external
//! collaborator"). Reports an ever-advancing empty chain — enough for the
//! node to start and for integration tests to substitute a fake — never a
//! real source of bridge events.

use async_trait::async_trait;
use bridge_chain::{ChainHead, ChainRpc, ChainRpcError, RawBridgeEvent, SubmissionReceipt};
use std::sync::atomic::{AtomicU64, Ordering};

pub struct PlaceholderChainRpc {
    height: AtomicU64,
}

impl PlaceholderChainRpc {
    pub fn new() -> Self {
        PlaceholderChainRpc { height: AtomicU64::new(0) }
    }
}

#[async_trait]
impl ChainRpc for PlaceholderChainRpc {
    async fn get_latest_block(&self) -> Result<ChainHead, ChainRpcError> {
        let height = self.height.fetch_add(1, Ordering::Relaxed);
        Ok(ChainHead { height, hash: height.to_be_bytes().to_vec() })
    }

    async fn block_hash_at(&self, height: u64) -> Result<Vec<u8>, ChainRpcError> {
        Ok(height.to_be_bytes().to_vec())
    }

    async fn scan_events(&self, _from: u64, _to: u64) -> Result<Vec<RawBridgeEvent>, ChainRpcError> {
        Ok(Vec::new())
    }

    async fn submit_signed_transaction(&self, payload: &[u8]) -> Result<SubmissionReceipt, ChainRpcError> {
        Ok(SubmissionReceipt {
            tx_hash: payload.to_vec(),
            included_at_height: Some(self.height.load(Ordering::Relaxed)),
        })
    }
}
