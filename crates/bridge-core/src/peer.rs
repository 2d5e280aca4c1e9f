//! `ValidatorPeer` directory entry (spec §3, §4.4, §6).
//!
//! The directory is advisory only: safety depends on signature verification
//! over the canonical message, never on directory membership by itself. A
//! validator is in the "active set" iff its registration signature verifies
//! *and* its heartbeat is fresh (< 30s, spec §6) — both checks happen at the
//! call site (`bridge-aggregator`), not here.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerCapabilities {
    pub multi_sig: bool,
    pub emergency_response: bool,
    pub security_level: String,
    pub max_throughput: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorPeer {
    pub id: String,
    pub public_key: Vec<u8>,
    pub endpoint: String,
    /// Unix milliseconds of last accepted heartbeat.
    pub last_heartbeat: i64,
    pub declared_stake: u128,
    /// 0..100.
    pub reputation: u8,
    pub capabilities: PeerCapabilities,
}

impl ValidatorPeer {
    pub fn is_heartbeat_fresh(&self, now_unix_ms: i64, ttl_ms: i64) -> bool {
        now_unix_ms.saturating_sub(self.last_heartbeat) < ttl_ms
    }

    pub fn touch_heartbeat(&mut self, now_unix_ms: i64) {
        self.last_heartbeat = now_unix_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(last_heartbeat: i64) -> ValidatorPeer {
        ValidatorPeer {
            id: "val-1".into(),
            public_key: vec![1, 2, 3],
            endpoint: "https://val1.example".into(),
            last_heartbeat,
            declared_stake: 1000,
            reputation: 100,
            capabilities: PeerCapabilities {
                multi_sig: true,
                emergency_response: true,
                security_level: "enhanced".into(),
                max_throughput: 100,
            },
        }
    }

    #[test]
    fn heartbeat_freshness_respects_ttl() {
        let p = peer(1_000);
        assert!(p.is_heartbeat_fresh(1_000 + 29_999, 30_000));
        assert!(!p.is_heartbeat_fresh(1_000 + 30_000, 30_000));
    }
}
