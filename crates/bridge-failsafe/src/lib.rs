//! Failsafe controller (spec §4.6, component C6): the only component that
//! consumes every other component's `HealthEvent`s and is the sole owner of
//! emergency-mode state and automated response.

pub mod controller;
pub mod policy;

pub use controller::{FailsafeConfig, FailsafeController, ResponseExecutor, SnapshotTrigger};
pub use policy::default_responses;
