//! `EmergencyEvent` and the closed sets of incident kinds / severities /
//! response actions it is built from (spec §3, §4.6).
//!
//! Detection is rule-based and deterministic — never ML, never a heuristic
//! score — so that every honest validator independently reaches the same
//! verdict on the same inputs. `EmergencyEvent` itself is an immutable
//! record once created; the failsafe controller in `bridge-failsafe` is the
//! only thing that mutates `responses`/`resolved_at` as it acts.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Closed set of emergency kinds (spec §4.6). Adding a new variant is a
/// protocol change, not a refactor — every validator must agree on the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncidentKind {
    ConsensusFailure,
    NetworkPartition,
    SecurityBreach,
    ValidatorCompromise,
    ByzantineBehavior,
    BridgeCorruption,
    LiquidityCrisis,
    OracleFailure,
    SystemOverload,
    DataCorruption,
    CatastrophicFailure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EmergencySeverity {
    Low,
    Medium,
    High,
    Critical,
    Catastrophic,
}

/// Closed set of automated response actions (spec §4.6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseAction {
    PauseBridge,
    ActivateBackup,
    IsolateValidator(String),
    EmergencyShutdown,
    RestoreFromBackup(String),
    NotifyContacts,
    InitiateRecovery,
    RequireManualIntervention,
    RollbackState(String),
    SwitchToManual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseStatus {
    Pending,
    Executing,
    Succeeded,
    Failed,
    RequiresManualAck,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub action: ResponseAction,
    pub status: ResponseStatus,
    /// Unix milliseconds.
    pub executed_at: i64,
}

/// Deterministic identifier for an emergency event: `SHA-256(kind ||
/// subject || opened_at)`. Same inputs always yield the same id, matching
/// the deterministic-incident-hash invariant this was grounded on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EmergencyEventId(pub [u8; 32]);

impl EmergencyEventId {
    pub fn derive(kind: IncidentKind, subject: &str, opened_at: i64) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", kind).as_bytes());
        hasher.update(subject.as_bytes());
        hasher.update(opened_at.to_le_bytes());
        let digest = hasher.finalize();
        let mut id = [0u8; 32];
        id.copy_from_slice(&digest);
        EmergencyEventId(id)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyEvent {
    pub id: EmergencyEventId,
    pub kind: IncidentKind,
    pub severity: EmergencySeverity,
    /// Unix milliseconds.
    pub opened_at: i64,
    /// Unix milliseconds; `None` while the event is open.
    pub resolved_at: Option<i64>,
    /// The validator id this event concerns, or `"network"` for node-wide
    /// conditions (partition, systemic overload, ...).
    pub subject: String,
    pub responses: Vec<ResponseRecord>,
    /// 0..4, escalates on wall-clock thresholds independent of severity.
    pub escalation_level: u8,
    pub description: String,
}

impl EmergencyEvent {
    pub fn open(
        kind: IncidentKind,
        severity: EmergencySeverity,
        subject: impl Into<String>,
        opened_at: i64,
        description: impl Into<String>,
    ) -> Self {
        let subject = subject.into();
        let id = EmergencyEventId::derive(kind, &subject, opened_at);
        EmergencyEvent {
            id,
            kind,
            severity,
            opened_at,
            resolved_at: None,
            subject,
            responses: Vec::new(),
            escalation_level: 0,
            description: description.into(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.resolved_at.is_none()
    }

    pub fn resolve(&mut self, resolved_at: i64) {
        self.resolved_at = Some(resolved_at);
    }

    pub fn record_response(&mut self, action: ResponseAction, status: ResponseStatus, executed_at: i64) {
        self.responses.push(ResponseRecord { action, status, executed_at });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_inputs_yield_same_id() {
        let a = EmergencyEventId::derive(IncidentKind::ByzantineBehavior, "val-3", 1000);
        let b = EmergencyEventId::derive(IncidentKind::ByzantineBehavior, "val-3", 1000);
        assert_eq!(a, b);
    }

    #[test]
    fn resolving_closes_event() {
        let mut event = EmergencyEvent::open(
            IncidentKind::NetworkPartition,
            EmergencySeverity::High,
            "network",
            1000,
            "4 of 9 validators partitioned",
        );
        assert!(event.is_open());
        event.resolve(2000);
        assert!(!event.is_open());
    }
}
