//! Development-time tracing for the CLI.
//!
//! Reads `RUST_LOG`; output goes to stderr so it never mixes with command
//! output on stdout.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Defaults to `warn` if `RUST_LOG` is unset, which still surfaces responder
/// fallbacks. Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=hyperfocus=debug hyperfocus session --minutes 25
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
