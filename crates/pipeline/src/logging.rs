//! Tracing subscriber setup

use crate::settings::LogFormat;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Output goes to stderr so reports on
/// stdout stay machine-readable. `RUST_LOG` overrides the `info` default.
pub fn init_logging(format: LogFormat) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
}
