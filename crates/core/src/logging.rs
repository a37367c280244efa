//! Logging initialization.
//!
//! Every binary and test harness goes through one of the two entry points
//! here; nothing else in the workspace installs a subscriber. The active
//! level comes from `RUST_LOG`, falling back to `info`.

use tracing_subscriber::EnvFilter;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the human-readable subscriber used during development.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .init();
}

/// Install the JSON subscriber for deployments that ship logs to an
/// aggregator.
pub fn init_json() {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(env_filter())
        .with_target(true)
        .with_current_span(false)
        .init();
}
