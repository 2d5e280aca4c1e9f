use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error(
        "threshold {threshold} is below the Byzantine safety floor {floor} for {total_validators} validators; \
         pass --i-know-what-im-doing to start anyway"
    )]
    ThresholdBelowSafetyFloor { threshold: usize, floor: usize, total_validators: usize },

    #[error("total_validators must be at least 1, got {0}")]
    EmptyNetwork(usize),

    #[error("emergency_contacts must not be empty")]
    NoEmergencyContacts,

    #[error("security_level must be one of standard, enhanced, military, got {0:?}")]
    InvalidSecurityLevel(String),
}
