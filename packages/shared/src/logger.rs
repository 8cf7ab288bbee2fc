//! Logging setup for the Taleweave binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// Both the server library crate and the binary log at `default_log_level`, and
/// `tower_http` request traces are enabled at the same level. The `RUST_LOG`
/// environment variable overrides all of it.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "taleweave_server")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use taleweave_shared::logger::setup_logger;
///
/// setup_logger("taleweave_server", "info");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directives(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build the filter directives used when `RUST_LOG` is not set.
fn default_directives(binary_name: &str, default_log_level: &str) -> String {
    format!(
        "taleweave_server={level},{bin}={level},tower_http={level}",
        level = default_log_level,
        bin = binary_name.replace('-', "_"),
    )
}
