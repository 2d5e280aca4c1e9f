//! Failsafe state machine (spec §4.6, component C6): correlates
//! `HealthEvent`s into `EmergencyEvent`s, escalates by wall clock, enforces
//! the per-window auto-response budget, and drives response execution
//! through the `ResponseExecutor`/`SnapshotTrigger` seams.
//!
//! Grounded on the teacher's incident detector / recovery controller split:
//! detection stays rule-based and deterministic, recovery stays
//! precondition-gated with an immutable audit trail. The teacher's
//! consensus-specific preconditions (min_validators, per-incident slash cap)
//! have no counterpart here; what survives is the shape — cooldown before
//! re-acting, and a hard budget on how much gets done automatically before
//! a human has to sign off.

use std::sync::Arc;

use async_trait::async_trait;
use bridge_core::{
    EmergencyEvent, EmergencyEventId, EmergencySeverity, HealthEvent, IncidentKind, ResponseAction, ResponseStatus,
};
use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::policy::default_responses;

/// Wall-clock escalation thresholds (spec §4.6), milliseconds since an
/// event opened. Escalation is independent of severity: a `Low` incident
/// open for an hour escalates just like a `Critical` one.
const ESCALATION_THRESHOLDS_MS: [i64; 4] = [5 * 60_000, 15 * 60_000, 30 * 60_000, 60 * 60_000];

#[async_trait]
pub trait SnapshotTrigger: Send + Sync {
    async fn snapshot_now(&self, reason: &str);
}

#[async_trait]
pub trait ResponseExecutor: Send + Sync {
    async fn execute(&self, action: &ResponseAction) -> Result<(), String>;
}

#[derive(Debug, Clone)]
pub struct FailsafeConfig {
    /// Auto-responses allowed per open emergency window before further
    /// actions require manual acknowledgment.
    pub max_auto_responses: u32,
    /// How often `run` issues a periodic snapshot while in emergency mode.
    pub periodic_snapshot_interval_ms: i64,
}

impl Default for FailsafeConfig {
    fn default() -> Self {
        FailsafeConfig { max_auto_responses: 10, periodic_snapshot_interval_ms: 5 * 60_000 }
    }
}

struct OpenIncident {
    event: EmergencyEvent,
    auto_responses_issued: u32,
}

/// Detects, escalates, and responds to emergencies. All mutation of
/// `active` happens from the single task that owns `run`; the audit trail
/// (`history`) is append-only.
pub struct FailsafeController {
    config: FailsafeConfig,
    active: DashMap<EmergencyEventId, OpenIncident>,
    history: Arc<tokio::sync::Mutex<Vec<EmergencyEvent>>>,
    snapshots: Arc<dyn SnapshotTrigger>,
    executor: Arc<dyn ResponseExecutor>,
    partition_correlation: DashMap<String, Vec<i64>>,
}

impl FailsafeController {
    pub fn new(config: FailsafeConfig, snapshots: Arc<dyn SnapshotTrigger>, executor: Arc<dyn ResponseExecutor>) -> Self {
        FailsafeController {
            config,
            active: DashMap::new(),
            history: Arc::new(tokio::sync::Mutex::new(Vec::new())),
            snapshots,
            executor,
            partition_correlation: DashMap::new(),
        }
    }

    pub fn is_emergency_mode(&self) -> bool {
        !self.active.is_empty()
    }

    pub async fn active_incidents(&self) -> Vec<EmergencyEvent> {
        self.active.iter().map(|e| e.event.clone()).collect()
    }

    pub async fn history(&self) -> Vec<EmergencyEvent> {
        self.history.lock().await.clone()
    }

    /// Consumes `incoming` until the channel closes, running forever as its
    /// own task (one of the fixed task set in spec §5).
    pub async fn run(self: Arc<Self>, mut incoming: mpsc::Receiver<HealthEvent>, now_fn: impl Fn() -> i64) {
        while let Some(event) = incoming.recv().await {
            let now = now_fn();
            self.report(event, now).await;
        }
    }

    /// Entry point every other component routes safety-violating and
    /// degradation events through (spec.md §7: "always routed directly to
    /// `FailsafeController::report`"). Safe to call directly without going
    /// through the channel, e.g. from tests or a synchronous caller.
    pub async fn report(&self, event: HealthEvent, now: i64) {
        self.handle_health_event(event, now).await;
        self.escalate_all(now).await;
    }

    async fn handle_health_event(&self, event: HealthEvent, now: i64) {
        let was_emergency = self.is_emergency_mode();
        let (kind, severity, subject, description) = classify(&event);

        // Three Medium NetworkPartition reports for the same subject within
        // 5 minutes raise the severity to High (spec §4.6 correlation rule).
        let severity = if matches!(kind, IncidentKind::NetworkPartition) && severity == EmergencySeverity::Medium {
            self.correlate_partition(&subject, now)
        } else {
            severity
        };

        let id = EmergencyEventId::derive(kind, &subject, now);
        if self.active.iter().any(|e| e.event.kind == kind && e.event.subject == subject) {
            // Already tracking an open incident for this (kind, subject);
            // don't open a duplicate, let escalation handle it.
            return;
        }

        let mut incident = EmergencyEvent::open(kind, severity, subject, now, description);
        tracing::warn!(kind = ?kind, severity = ?severity, subject = %incident.subject, "emergency opened");

        if !was_emergency {
            self.snapshots.snapshot_now("emergency-mode-entered").await;
        }

        self.apply_responses(&mut incident, now).await;
        let auto_responses_issued = incident.responses.len() as u32;
        self.active.insert(id, OpenIncident { event: incident, auto_responses_issued });
    }

    fn correlate_partition(&self, subject: &str, now: i64) -> EmergencySeverity {
        let mut occurrences = self.partition_correlation.entry(subject.to_string()).or_default();
        occurrences.retain(|&t| now - t <= 5 * 60_000);
        occurrences.push(now);
        if occurrences.len() >= 3 {
            EmergencySeverity::High
        } else {
            EmergencySeverity::Medium
        }
    }

    async fn apply_responses(&self, incident: &mut EmergencyEvent, now: i64) {
        for action in default_responses(incident.kind, incident.severity) {
            let action = bind_subject(action, &incident.subject);
            if matches!(action, ResponseAction::RollbackState(_)) {
                self.snapshots.snapshot_now("pre-rollback").await;
            }
            match self.executor.execute(&action).await {
                Ok(()) => incident.record_response(action, ResponseStatus::Succeeded, now),
                Err(err) => {
                    tracing::error!(error = %err, "response action failed");
                    incident.record_response(action, ResponseStatus::Failed, now);
                }
            }
        }
    }

    async fn escalate_all(&self, now: i64) {
        let ids: Vec<_> = self.active.iter().map(|e| *e.key()).collect();
        for id in ids {
            self.escalate_one(id, now).await;
        }
    }

    async fn escalate_one(&self, id: EmergencyEventId, now: i64) {
        let (should_escalate, severity, subject, auto_responses_issued) = {
            let Some(incident) = self.active.get(&id) else { return };
            let age = now - incident.event.opened_at;
            let next_level = ESCALATION_THRESHOLDS_MS
                .iter()
                .take_while(|&&threshold| age >= threshold)
                .count() as u8;
            (
                next_level > incident.event.escalation_level,
                incident.event.severity,
                incident.event.subject.clone(),
                incident.auto_responses_issued,
            )
        };
        if !should_escalate {
            return;
        }

        if auto_responses_issued >= self.config.max_auto_responses {
            tracing::warn!(subject = %subject, "auto-response budget exhausted, requires manual acknowledgment");
            if let Some(mut incident) = self.active.get_mut(&id) {
                incident.event.record_response(
                    ResponseAction::RequireManualIntervention,
                    ResponseStatus::RequiresManualAck,
                    now,
                );
            }
            return;
        }

        let mut incident = self.active.get_mut(&id).expect("checked above");
        incident.event.escalation_level = incident.event.escalation_level.saturating_add(1);
        tracing::warn!(subject = %subject, level = incident.event.escalation_level, "emergency escalated");
        drop(incident);

        let bumped = bump_severity(severity);
        let mut incident = self.active.get_mut(&id).expect("checked above");
        incident.event.severity = bumped;
        let mut owned = incident.event.clone();
        drop(incident);
        self.apply_responses(&mut owned, now).await;
        if let Some(mut incident) = self.active.get_mut(&id) {
            incident.event.responses = owned.responses;
            incident.auto_responses_issued = incident.event.responses.len() as u32;
        }
    }

    /// Marks the incident for `(kind, subject)` resolved. Exiting emergency
    /// mode requires every open event to be resolved (spec §4.6); this only
    /// closes one, the caller observes `is_emergency_mode()` afterward.
    pub async fn resolve(&self, kind: IncidentKind, subject: &str, now: i64) {
        let id = self.active.iter().find(|e| e.event.kind == kind && e.event.subject == subject).map(|e| *e.key());
        let Some(id) = id else { return };
        if let Some((_, mut incident)) = self.active.remove(&id) {
            incident.event.resolve(now);
            tracing::info!(subject = %subject, "emergency resolved");
            self.history.lock().await.push(incident.event);
        }
    }
}

fn bump_severity(severity: EmergencySeverity) -> EmergencySeverity {
    use EmergencySeverity::*;
    match severity {
        Low => Medium,
        Medium => High,
        High => Critical,
        Critical | Catastrophic => Catastrophic,
    }
}

fn bind_subject(action: ResponseAction, subject: &str) -> ResponseAction {
    match action {
        ResponseAction::IsolateValidator(_) => ResponseAction::IsolateValidator(subject.to_string()),
        ResponseAction::RestoreFromBackup(_) => ResponseAction::RestoreFromBackup(subject.to_string()),
        ResponseAction::RollbackState(_) => ResponseAction::RollbackState(subject.to_string()),
        other => other,
    }
}

fn classify(event: &HealthEvent) -> (IncidentKind, EmergencySeverity, String, String) {
    match event {
        HealthEvent::ChainRpcDegraded { chain_id, consecutive_failures } => (
            IncidentKind::NetworkPartition,
            EmergencySeverity::Medium,
            format!("chain:{chain_id}"),
            format!("RPC degraded after {consecutive_failures} consecutive failures"),
        ),
        HealthEvent::StoreDegraded { consecutive_failures } => (
            IncidentKind::SystemOverload,
            EmergencySeverity::Medium,
            "coordination-store".to_string(),
            format!("coordination store unreachable after {consecutive_failures} failures"),
        ),
        HealthEvent::ExecutionFailed { transfer_id, attempts } => (
            IncidentKind::ConsensusFailure,
            EmergencySeverity::Critical,
            format!("transfer:{transfer_id}"),
            format!("execution failed after {attempts} attempts"),
        ),
        HealthEvent::Equivocation { validator_id, transfer_id } => (
            IncidentKind::ByzantineBehavior,
            EmergencySeverity::High,
            validator_id.clone(),
            format!("double-signed transfer {transfer_id}"),
        ),
        HealthEvent::InvalidPeerEntry { validator_id } => (
            IncidentKind::SecurityBreach,
            EmergencySeverity::High,
            validator_id.clone(),
            "peer directory entry failed signature verification".to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct NoopSnapshot(AtomicU32);
    #[async_trait]
    impl SnapshotTrigger for NoopSnapshot {
        async fn snapshot_now(&self, _reason: &str) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct RecordingExecutor(tokio::sync::Mutex<Vec<ResponseAction>>);
    #[async_trait]
    impl ResponseExecutor for RecordingExecutor {
        async fn execute(&self, action: &ResponseAction) -> Result<(), String> {
            self.0.lock().await.push(action.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn equivocation_opens_byzantine_incident_and_isolates() {
        let snapshots = Arc::new(NoopSnapshot(AtomicU32::new(0)));
        let executor = Arc::new(RecordingExecutor(tokio::sync::Mutex::new(Vec::new())));
        let controller = Arc::new(FailsafeController::new(FailsafeConfig::default(), snapshots.clone(), executor.clone()));

        controller
            .handle_health_event(
                HealthEvent::Equivocation { validator_id: "val-3".into(), transfer_id: "abc".into() },
                1_000,
            )
            .await;

        assert!(controller.is_emergency_mode());
        assert_eq!(snapshots.0.load(Ordering::SeqCst), 1);
        let executed = executor.0.lock().await;
        assert!(executed.iter().any(|a| matches!(a, ResponseAction::IsolateValidator(id) if id == "val-3")));
    }

    #[tokio::test]
    async fn resolving_the_only_incident_exits_emergency_mode() {
        let snapshots = Arc::new(NoopSnapshot(AtomicU32::new(0)));
        let executor = Arc::new(RecordingExecutor(tokio::sync::Mutex::new(Vec::new())));
        let controller = Arc::new(FailsafeController::new(FailsafeConfig::default(), snapshots, executor));

        controller
            .handle_health_event(HealthEvent::StoreDegraded { consecutive_failures: 5 }, 1_000)
            .await;
        assert!(controller.is_emergency_mode());

        controller.resolve(IncidentKind::SystemOverload, "coordination-store", 2_000).await;
        assert!(!controller.is_emergency_mode());
        assert_eq!(controller.history().await.len(), 1);
    }

    #[tokio::test]
    async fn three_medium_partitions_within_window_escalate_to_high() {
        let snapshots = Arc::new(NoopSnapshot(AtomicU32::new(0)));
        let executor = Arc::new(RecordingExecutor(tokio::sync::Mutex::new(Vec::new())));
        let controller = Arc::new(FailsafeController::new(FailsafeConfig::default(), snapshots, executor));

        let event = HealthEvent::ChainRpcDegraded { chain_id: 1, consecutive_failures: 3 };
        controller.handle_health_event(event.clone(), 1_000).await;
        controller.resolve(IncidentKind::NetworkPartition, "chain:1", 1_100).await;
        controller.handle_health_event(event.clone(), 1_200).await;
        controller.resolve(IncidentKind::NetworkPartition, "chain:1", 1_300).await;
        controller.handle_health_event(event, 1_400).await;

        let incidents = controller.active_incidents().await;
        assert_eq!(incidents.len(), 1);
        assert_eq!(incidents[0].severity, EmergencySeverity::High);
    }
}
