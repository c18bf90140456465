//! Logging setup for the Kairo binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose events are shown at the default level.
const WORKSPACE_CRATES: [&str; 3] = ["kairo_shared", "kairo_server", "kairo_client"];

/// Build the default filter directive used when `RUST_LOG` is not set.
///
/// Every workspace crate and the binary itself are enabled at
/// `default_log_level`; everything else (axum, hyper, tungstenite) stays at
/// the subscriber's default.
pub fn default_directive(binary_name: &str, default_log_level: &str) -> String {
    let binary = binary_name.replace('-', "_");
    WORKSPACE_CRATES
        .iter()
        .copied()
        .chain(std::iter::once(binary.as_str()))
        .map(|target| format!("{target}={default_log_level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize the tracing subscriber with the specified default log level.
///
/// The log level can be overridden using the `RUST_LOG` environment variable.
///
/// # Examples
///
/// ```no_run
/// use kairo_shared::logger::setup_logger;
///
/// setup_logger("kairo-server", "debug");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
