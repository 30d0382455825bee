//! Structured logging to stderr, filtered by `XPUB_LOG`.

use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::CliResult;

pub const LOG_ENV: &str = "XPUB_LOG";

/// Installs the global subscriber. `XPUB_LOG` takes any `EnvFilter`
/// directive; without it the level is `warn`, or `info` with `--verbose`.
pub fn init_logging(verbose: bool) -> CliResult<()> {
    let filter = env_filter(std::env::var(LOG_ENV).ok().as_deref(), verbose)?;
    Registry::default()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init()?;
    Ok(())
}

fn env_filter(directive: Option<&str>, verbose: bool) -> CliResult<EnvFilter> {
    match directive.map(str::trim).filter(|value| !value.is_empty()) {
        Some(directive) => Ok(EnvFilter::try_new(directive)?),
        None if verbose => Ok(EnvFilter::new("info")),
        None => Ok(EnvFilter::new("warn")),
    }
}
