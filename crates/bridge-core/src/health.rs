//! Health degradation events that any component can emit toward the
//! failsafe controller (spec §4.2, §4.5, §7: "Transient external errors...
//! after N failures, reported to failsafe as degradation").
//!
//! This is intentionally the thinnest possible shared vocabulary — just
//! enough for `bridge-failsafe` to correlate events from unrelated
//! components without each of them depending on `bridge-failsafe` itself
//! (Design Notes: "failsafe a consumer of an event stream rather than a
//! direct callee").

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthEvent {
    /// A chain observer lost RPC connectivity for N consecutive attempts.
    ChainRpcDegraded { chain_id: u64, consecutive_failures: u32 },
    /// The coordination store is unreachable.
    StoreDegraded { consecutive_failures: u32 },
    /// Execution of an authorized bundle failed after all retries.
    ExecutionFailed { transfer_id: String, attempts: u32 },
    /// A peer signed two different messages for the same transfer id.
    Equivocation { validator_id: String, transfer_id: String },
    /// A peer's directory registration or heartbeat failed signature
    /// verification.
    InvalidPeerEntry { validator_id: String },
}
