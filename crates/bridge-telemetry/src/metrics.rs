//! `NodeMetrics` (spec.md §6.2, §6 heartbeat payload): process-lifetime
//! counters feeding the heartbeat's `metrics{...}` object.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Wire shape of the heartbeat's `metrics` object (spec.md §6: `{id,
/// timestamp, status, metrics{tx_validated, sigs_provided,
/// consensus_participation, uptime_pct, response_time_ms}, network_size,
/// pending_tx_count}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatMetrics {
    pub tx_validated: u64,
    pub sigs_provided: u64,
    pub consensus_participation: u64,
    pub uptime_pct: f64,
    pub response_time_ms: u64,
}

pub struct NodeMetrics {
    transfers_validated: AtomicU64,
    signatures_issued: AtomicU64,
    bundles_sealed: AtomicU64,
    emergencies_opened: AtomicU64,
    started_at: Instant,
    last_tick_elapsed_ms: AtomicU64,
}

impl Default for NodeMetrics {
    fn default() -> Self {
        NodeMetrics {
            transfers_validated: AtomicU64::new(0),
            signatures_issued: AtomicU64::new(0),
            bundles_sealed: AtomicU64::new(0),
            emergencies_opened: AtomicU64::new(0),
            started_at: Instant::now(),
            last_tick_elapsed_ms: AtomicU64::new(0),
        }
    }
}

impl NodeMetrics {
    pub fn new() -> Self {
        NodeMetrics::default()
    }

    pub fn record_transfer_validated(&self) {
        self.transfers_validated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_signature_issued(&self) {
        self.signatures_issued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_bundle_sealed(&self) {
        self.bundles_sealed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_emergency_opened(&self) {
        self.emergencies_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tick_latency_ms(&self, ms: u64) {
        self.last_tick_elapsed_ms.store(ms, Ordering::Relaxed);
    }

    /// `uptime_pct` is always 100.0 here: a node that can answer this call
    /// is, by definition, up. Degraded-but-alive states show up as open
    /// emergencies, not a fractional uptime.
    pub fn to_heartbeat_metrics(&self) -> HeartbeatMetrics {
        HeartbeatMetrics {
            tx_validated: self.transfers_validated.load(Ordering::Relaxed),
            sigs_provided: self.signatures_issued.load(Ordering::Relaxed),
            consensus_participation: self.bundles_sealed.load(Ordering::Relaxed),
            uptime_pct: 100.0,
            response_time_ms: self.last_tick_elapsed_ms.load(Ordering::Relaxed),
        }
    }

    pub fn uptime(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    pub fn emergencies_opened(&self) -> u64 {
        self.emergencies_opened.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = NodeMetrics::new();
        metrics.record_transfer_validated();
        metrics.record_transfer_validated();
        metrics.record_signature_issued();

        let snapshot = metrics.to_heartbeat_metrics();
        assert_eq!(snapshot.tx_validated, 2);
        assert_eq!(snapshot.sigs_provided, 1);
    }
}
