//! Logging setup
//!
//! Console logging through `tracing-subscriber`. `RUST_LOG` takes precedence
//! over the level chosen on the command line.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::core::error::{GondolaError, Result};

/// Build the filter used when `RUST_LOG` is not set
pub fn default_filter(debug: bool) -> EnvFilter {
    let level = if debug { "gondola=debug" } else { "gondola=info" };
    EnvFilter::new(level)
}

/// Initialize the global subscriber
pub fn init_logging(debug: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(debug));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init()
        .map_err(|e| GondolaError::Other(format!("Failed to initialize logging: {}", e)))
}
