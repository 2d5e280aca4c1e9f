//! `(kind, severity) -> ordered responses` policy table (spec §4.6).
//!
//! Rule-based and deterministic by design, same discipline the teacher's
//! incident detector insists on for its own rules: "Detection rules are
//! rule-based (NOT ML, NOT heuristics)". The four rules spec.md states
//! explicitly are reproduced verbatim; the remaining `(kind, severity)`
//! pairs are filled in conservatively (see DESIGN.md for the rationale
//! behind each).

use bridge_core::{EmergencySeverity, IncidentKind, ResponseAction};

pub fn default_responses(kind: IncidentKind, severity: EmergencySeverity) -> Vec<ResponseAction> {
    use EmergencySeverity::*;
    use IncidentKind::*;

    match (kind, severity) {
        (SecurityBreach, Catastrophic) => vec![
            ResponseAction::EmergencyShutdown,
            ResponseAction::NotifyContacts,
            ResponseAction::SwitchToManual,
        ],
        (ByzantineBehavior, High) => vec![
            ResponseAction::IsolateValidator(String::new()),
            ResponseAction::PauseBridge,
            ResponseAction::InitiateRecovery,
        ],
        (ConsensusFailure, Critical) => vec![
            ResponseAction::PauseBridge,
            ResponseAction::ActivateBackup,
            ResponseAction::RequireManualIntervention,
        ],
        (NetworkPartition, High) => vec![ResponseAction::PauseBridge, ResponseAction::InitiateRecovery],

        // Escalations of the four rules above to the next severity step up.
        (SecurityBreach, _) => vec![ResponseAction::PauseBridge, ResponseAction::NotifyContacts],
        (ByzantineBehavior, Catastrophic) => vec![
            ResponseAction::IsolateValidator(String::new()),
            ResponseAction::EmergencyShutdown,
            ResponseAction::NotifyContacts,
        ],
        (ByzantineBehavior, _) => vec![ResponseAction::IsolateValidator(String::new())],
        (ConsensusFailure, Catastrophic) => vec![
            ResponseAction::EmergencyShutdown,
            ResponseAction::RequireManualIntervention,
        ],
        (ConsensusFailure, _) => vec![ResponseAction::PauseBridge],
        (NetworkPartition, Catastrophic) => vec![ResponseAction::PauseBridge, ResponseAction::SwitchToManual],
        (NetworkPartition, _) => vec![ResponseAction::NotifyContacts],

        (ValidatorCompromise, Low) | (ValidatorCompromise, Medium) => {
            vec![ResponseAction::IsolateValidator(String::new())]
        }
        (ValidatorCompromise, _) => {
            vec![ResponseAction::IsolateValidator(String::new()), ResponseAction::PauseBridge]
        }

        (BridgeCorruption, Catastrophic) | (DataCorruption, Catastrophic) => vec![
            ResponseAction::EmergencyShutdown,
            ResponseAction::RestoreFromBackup(String::new()),
            ResponseAction::NotifyContacts,
        ],
        (BridgeCorruption, _) | (DataCorruption, _) => {
            vec![ResponseAction::PauseBridge, ResponseAction::RollbackState(String::new())]
        }

        (LiquidityCrisis, Critical) | (LiquidityCrisis, Catastrophic) => {
            vec![ResponseAction::PauseBridge, ResponseAction::NotifyContacts]
        }
        (LiquidityCrisis, _) => vec![ResponseAction::NotifyContacts],

        (OracleFailure, _) => vec![ResponseAction::PauseBridge, ResponseAction::RequireManualIntervention],

        (SystemOverload, Critical) | (SystemOverload, Catastrophic) => {
            vec![ResponseAction::PauseBridge, ResponseAction::ActivateBackup]
        }
        (SystemOverload, _) => vec![ResponseAction::NotifyContacts],

        (CatastrophicFailure, _) => vec![
            ResponseAction::EmergencyShutdown,
            ResponseAction::NotifyContacts,
            ResponseAction::RequireManualIntervention,
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn security_breach_catastrophic_matches_spec_example() {
        let actions = default_responses(IncidentKind::SecurityBreach, EmergencySeverity::Catastrophic);
        assert_eq!(
            actions,
            vec![ResponseAction::EmergencyShutdown, ResponseAction::NotifyContacts, ResponseAction::SwitchToManual]
        );
    }

    #[test]
    fn network_partition_high_matches_spec_example() {
        let actions = default_responses(IncidentKind::NetworkPartition, EmergencySeverity::High);
        assert_eq!(actions, vec![ResponseAction::PauseBridge, ResponseAction::InitiateRecovery]);
    }
}
