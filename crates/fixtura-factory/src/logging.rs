use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::prelude::*;

use fixtura_core::LoggingConfig;

use crate::errors::{FactoryError, Result};

/// Install a global subscriber. `RUST_LOG` takes precedence over `level`.
///
/// Fails with [`FactoryError::Logging`] when a subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|err| FactoryError::Logging(err.to_string()))?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.json {
        let layer = fmt::layer().json().with_timer(UtcTime::rfc_3339());
        registry.with(layer).try_init()
    } else {
        let layer = fmt::layer().compact().with_timer(UtcTime::rfc_3339());
        registry.with(layer).try_init()
    };

    result.map_err(|err| FactoryError::Logging(err.to_string()))
}
