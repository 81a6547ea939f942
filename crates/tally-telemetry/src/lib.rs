//! Logging for Tally
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and a
//! text or JSON formatting layer.

use tally_config::{LogFormat, TelemetryConfig};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable that overrides the configured filter
pub const FILTER_ENV: &str = "RUST_LOG";

/// Initialize logging from configuration
///
/// `RUST_LOG`, when set, takes precedence over `log_filter`.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed
pub fn init(config: &TelemetryConfig) -> anyhow::Result<()> {
    let from_env = std::env::var(FILTER_ENV).ok();
    let filter = build_filter(from_env.as_deref(), &config.log_filter);

    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.log_format {
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .flatten_event(true),
            )
            .try_init(),
    };

    installed.map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))
}

/// Pick the filter directive, falling back to `info` when it does not parse
fn build_filter(from_env: Option<&str>, configured: &str) -> EnvFilter {
    let directive = from_env.filter(|value| !value.trim().is_empty()).unwrap_or(configured);

    EnvFilter::try_new(directive).unwrap_or_else(|e| {
        eprintln!("invalid log filter {directive:?} ({e}), using info");
        EnvFilter::new("info")
    })
}
