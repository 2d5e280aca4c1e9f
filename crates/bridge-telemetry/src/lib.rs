//! Structured logging setup and node metrics (spec.md §6.2).

pub mod logging;
pub mod metrics;

pub use logging::init_tracing;
pub use metrics::{HeartbeatMetrics, NodeMetrics};
