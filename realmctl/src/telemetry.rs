//! Tracing initialization.
//!
//! Logs go to stderr so stdout stays reserved for command output. The filter is taken from
//! `RUST_LOG` when set, otherwise `info` (or `debug` with `--verbose`).

use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install the global subscriber. Fails if one is already installed.
pub fn init_telemetry(verbose: bool) -> anyhow::Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()?;

    debug!("Telemetry initialized");
    Ok(())
}
