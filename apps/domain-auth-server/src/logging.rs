use crate::config::LoggingConfig;
use anyhow::{Context, Result, anyhow};
use tracing_subscriber::EnvFilter;

/// Filter from `RUST_LOG` if set, otherwise from the configured level.
fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level)
            .with_context(|| format!("invalid log filter '{}'", config.level)),
    }
}

pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = build_env_filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| anyhow!(e))
}
