//! `init_tracing` (spec.md §6.2): one call from the process entry point,
//! wiring `tracing-subscriber`'s env-filter so `RUST_LOG` still works but
//! defaulting to a sensible level derived from the node's configured
//! security level.

use tracing_subscriber::EnvFilter;

/// Lower security levels get more verbose default logging; `military`
/// defaults to `info` to keep noisy debug output out of an environment
/// that's already running extra verification.
pub fn init_tracing(security_level: &str) {
    let default_directive = match security_level {
        "military" => "info",
        "enhanced" => "debug",
        _ => "debug",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .json()
        .init();
}
