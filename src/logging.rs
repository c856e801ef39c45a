//! Structured logging setup.
//!
//! Events go to stderr so command output on stdout stays clean. `RUST_LOG`
//! overrides the configured level.

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{Error, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset
pub fn default_filter(config: &LoggingConfig, verbose: bool) -> EnvFilter {
    let level = if verbose { "debug" } else { config.level.as_str() };
    EnvFilter::try_new(format!("{},hyper=info,tower_http=info", level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber.
///
/// Fails if one is already installed.
pub fn init(config: &LoggingConfig, verbose: bool) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(config, verbose));

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init(),
    };

    result.map_err(|e| Error::other(format!("failed to initialise logging: {}", e)))
}
