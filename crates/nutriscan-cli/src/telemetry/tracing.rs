//! Tracing initialization and configuration.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::fmt::format::{DefaultFields, Format};
use tracing_subscriber::{EnvFilter, Registry, fmt};

type StderrLayer = fmt::Layer<Registry, DefaultFields, Format, fn() -> std::io::Stderr>;

/// Filter applied when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "info";

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr so that stdout carries only the analysis.
///
/// # Configuration
///
/// The log level can be configured via the `RUST_LOG` environment variable.
/// If not set, defaults to `info` level.
///
/// # Examples
///
/// ```bash
/// RUST_LOG=warn nutriscan --brand front.jpg --nutrition label.jpg
/// RUST_LOG=nutriscan_core=debug,nutriscan_gemini=trace nutriscan ...
/// ```
///
/// # Errors
///
/// Returns an error if the tracing subscriber fails to initialize.
pub(super) fn init_tracing() -> anyhow::Result<()> {
    let env_filter = create_env_filter()?;
    let fmt_layer = create_fmt_layer();

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;

    Ok(())
}

/// Creates an environment filter for tracing.
fn create_env_filter() -> anyhow::Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .map_err(|e| anyhow::anyhow!("Failed to create env filter: {e}"))
}

/// Creates a formatted tracing layer writing to stderr.
fn create_fmt_layer() -> StderrLayer {
    fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_level(true)
        .with_ansi(true)
        .with_writer(std::io::stderr as fn() -> std::io::Stderr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_enables_info() {
        let filter = EnvFilter::try_new(DEFAULT_FILTER).unwrap();
        assert_eq!(filter.to_string(), "info");
    }
}
