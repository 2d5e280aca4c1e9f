//! Shared coordination state: peer directory and the monotonic nonce table
//! (spec §3 `ValidatorPeer`, §4.3 check 4, §6 peer directory/heartbeat
//! shapes). This is the state every component reads or writes that isn't a
//! single transfer's own signature set (that lives in `bridge-aggregator`).

use async_trait::async_trait;
use bridge_core::{Direction, ValidatorPeer};
use dashmap::DashMap;

#[async_trait]
pub trait CoordinationStore: Send + Sync {
    async fn upsert_peer(&self, peer: ValidatorPeer);
    async fn list_peers(&self) -> Vec<ValidatorPeer>;
    async fn touch_heartbeat(&self, validator_id: &str, now_unix_ms: i64);
    /// Removes peers whose heartbeat is older than `ttl_ms` as of `now`.
    async fn prune_stale_peers(&self, now_unix_ms: i64, ttl_ms: i64) -> Vec<String>;

    /// Persists a newly-accepted nonce for `(direction, sender_hex)`,
    /// keeping only the maximum ever seen — callers rely on this being
    /// monotonic non-decreasing (spec §4.3 check 4).
    async fn record_nonce(&self, direction: Direction, sender_hex: &str, nonce: u64);
    async fn highest_nonce(&self, direction: Direction, sender_hex: &str) -> Option<u64>;
}

#[derive(Default)]
pub struct InMemoryCoordinationStore {
    peers: DashMap<String, ValidatorPeer>,
    nonce_table: DashMap<(Direction, String), u64>,
}

impl InMemoryCoordinationStore {
    pub fn new() -> Self {
        InMemoryCoordinationStore::default()
    }
}

#[async_trait]
impl CoordinationStore for InMemoryCoordinationStore {
    async fn upsert_peer(&self, peer: ValidatorPeer) {
        self.peers.insert(peer.id.clone(), peer);
    }

    async fn list_peers(&self) -> Vec<ValidatorPeer> {
        self.peers.iter().map(|entry| entry.value().clone()).collect()
    }

    async fn touch_heartbeat(&self, validator_id: &str, now_unix_ms: i64) {
        if let Some(mut peer) = self.peers.get_mut(validator_id) {
            peer.touch_heartbeat(now_unix_ms);
        }
    }

    async fn prune_stale_peers(&self, now_unix_ms: i64, ttl_ms: i64) -> Vec<String> {
        let stale: Vec<String> = self
            .peers
            .iter()
            .filter(|entry| !entry.value().is_heartbeat_fresh(now_unix_ms, ttl_ms))
            .map(|entry| entry.key().clone())
            .collect();
        for id in &stale {
            self.peers.remove(id);
        }
        stale
    }

    async fn record_nonce(&self, direction: Direction, sender_hex: &str, nonce: u64) {
        self.nonce_table
            .entry((direction, sender_hex.to_string()))
            .and_modify(|v| *v = (*v).max(nonce))
            .or_insert(nonce);
    }

    async fn highest_nonce(&self, direction: Direction, sender_hex: &str) -> Option<u64> {
        self.nonce_table.get(&(direction, sender_hex.to_string())).map(|v| *v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn nonce_table_keeps_the_maximum() {
        let store = InMemoryCoordinationStore::new();
        store.record_nonce(Direction::L1ToL2, "abc", 5).await;
        store.record_nonce(Direction::L1ToL2, "abc", 3).await;
        assert_eq!(store.highest_nonce(Direction::L1ToL2, "abc").await, Some(5));
    }

    #[tokio::test]
    async fn prune_removes_stale_peers_only() {
        let store = InMemoryCoordinationStore::new();
        let capabilities = bridge_core::peer::PeerCapabilities {
            multi_sig: true,
            emergency_response: true,
            security_level: "standard".into(),
            max_throughput: 10,
        };
        let fresh = ValidatorPeer {
            id: "fresh".into(),
            public_key: vec![],
            endpoint: "".into(),
            last_heartbeat: 1000,
            declared_stake: 0,
            reputation: 0,
            capabilities: capabilities.clone(),
        };
        let stale = ValidatorPeer { id: "stale".into(), last_heartbeat: 0, ..fresh.clone() };
        store.upsert_peer(fresh).await;
        store.upsert_peer(stale).await;

        let removed = store.prune_stale_peers(1000, 500).await;
        assert_eq!(removed, vec!["stale".to_string()]);
        assert_eq!(store.list_peers().await.len(), 1);
    }
}
