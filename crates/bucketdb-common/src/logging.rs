//! Logging setup for binaries and tests that embed BucketDB

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::error::{Error, Result};

/// Install a global `tracing` subscriber.
///
/// `RUST_LOG` is honoured; BucketDB targets additionally default to
/// `config.level`. Fails with [`Error::Config`] if the level does not parse or a
/// global subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let directive = format!("bucketdb={}", config.level)
        .parse()
        .map_err(|e| Error::Config(format!("Invalid log level {:?}: {}", config.level, e)))?;
    let filter = EnvFilter::from_default_env().add_directive(directive);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| Error::Config(format!("Failed to install subscriber: {}", e)))
}
