//! Diagnostic logging for the binary.
//!
//! Library code only emits `tracing` events; installing a subscriber is left
//! to the binary. Simulation reports go to stdout, diagnostics to stderr.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG` if set, otherwise uses `fallback` (the configured
/// filter). Output: stderr, compact format.
pub fn init(fallback: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
