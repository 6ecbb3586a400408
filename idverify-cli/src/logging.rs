//! Diagnostic tracing for the verifier.
//!
//! - **Tracing (this module)**: diagnostics via `RUST_LOG`, written to stderr.
//! - **Report (`report`)**: the operator-facing verdicts. Always printed,
//!   unaffected by `RUST_LOG`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`. Defaults to `error` if unset; per-repository warnings
/// are already part of the report.
///
/// # Example
/// ```bash
/// RUST_LOG=idverify_sync=debug borg-id-verify /srv/borg
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
