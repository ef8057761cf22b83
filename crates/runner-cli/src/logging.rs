//! Diagnostics for debugging the runner itself.
//!
//! Step output (`=== RUN` / `--- END` lines and script output) goes through
//! the printer on stdout. This module only wires `tracing` events to stderr,
//! filtered by `RUST_LOG`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the stderr subscriber. Defaults to `warn` when `RUST_LOG` is unset.
///
/// ```bash
/// RUST_LOG=runner_core=debug runner run plan.toml
/// ```
pub(crate) fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}
