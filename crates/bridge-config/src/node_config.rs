//! `NodeConfig` (spec.md §6: "Configuration (closed set of options)").
//!
//! Loaded from a TOML file layered with environment overrides via the
//! `config` crate, then validated before the process does anything else —
//! invalid configuration is exit code 1 (spec.md §6), never a panic.

use std::path::Path;

use bridge_aggregator::min_safe_threshold;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub validator_id: String,
    pub key_file: std::path::PathBuf,
    pub threshold: usize,
    pub total_validators: usize,
    pub security_level: String,
    pub finality_depth_source: u64,
    pub finality_depth_dest: u64,
    pub rpc_url_source: String,
    pub rpc_url_dest: String,
    pub coord_store_url: String,
    pub emergency_contacts: Vec<String>,
    pub max_auto_responses: u32,
}

impl NodeConfig {
    /// Loads `path` (TOML) with `BRIDGE_` prefixed environment overrides,
    /// e.g. `BRIDGE_THRESHOLD=8`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("BRIDGE").separator("__"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Validates the closed configuration set (spec.md §6). `allow_unsafe_threshold`
    /// corresponds to the `--i-know-what-im-doing` override (spec.md Open
    /// Questions: decided to treat under-threshold configuration as a
    /// start-up error unless explicitly overridden).
    pub fn validate(&self, allow_unsafe_threshold: bool) -> Result<(), ConfigError> {
        if self.total_validators == 0 {
            return Err(ConfigError::EmptyNetwork(self.total_validators));
        }
        if self.emergency_contacts.is_empty() {
            return Err(ConfigError::NoEmergencyContacts);
        }
        if !matches!(self.security_level.as_str(), "standard" | "enhanced" | "military") {
            return Err(ConfigError::InvalidSecurityLevel(self.security_level.clone()));
        }

        let floor = min_safe_threshold(self.total_validators);
        if self.threshold < floor && !allow_unsafe_threshold {
            return Err(ConfigError::ThresholdBelowSafetyFloor {
                threshold: self.threshold,
                floor,
                total_validators: self.total_validators,
            });
        }
        if self.threshold < floor {
            tracing::warn!(
                threshold = self.threshold,
                floor,
                total_validators = self.total_validators,
                "starting with a threshold below the Byzantine safety floor"
            );
        }
        Ok(())
    }

    /// Snapshot retention and scan-frequency scaling by `security_level`
    /// (spec.md §6: "scales scan frequency and snapshot retention").
    pub fn snapshot_retention(&self) -> usize {
        match self.security_level.as_str() {
            "military" => 500,
            "enhanced" => 200,
            _ => 50,
        }
    }

    pub fn scan_interval_secs(&self) -> u64 {
        match self.security_level.as_str() {
            "military" => 3,
            "enhanced" => 5,
            _ => 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(threshold: usize, total_validators: usize) -> NodeConfig {
        NodeConfig {
            validator_id: "val-1".into(),
            key_file: "/tmp/val-1.key".into(),
            threshold,
            total_validators,
            security_level: "standard".into(),
            finality_depth_source: 12,
            finality_depth_dest: 20,
            rpc_url_source: "http://l1.example".into(),
            rpc_url_dest: "http://l2.example".into(),
            coord_store_url: "redis://store.example".into(),
            emergency_contacts: vec!["ops@example.com".into()],
            max_auto_responses: 10,
        }
    }

    #[test]
    fn rejects_threshold_below_safety_floor_by_default() {
        let config = sample(5, 9); // floor is ceil(2*9/3)+1 = 7
        assert!(matches!(
            config.validate(false),
            Err(ConfigError::ThresholdBelowSafetyFloor { .. })
        ));
    }

    #[test]
    fn override_flag_allows_unsafe_threshold() {
        let config = sample(5, 9);
        assert!(config.validate(true).is_ok());
    }

    #[test]
    fn accepts_safe_threshold() {
        let config = sample(7, 9);
        assert!(config.validate(false).is_ok());
    }
}
