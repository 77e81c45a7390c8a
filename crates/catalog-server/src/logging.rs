//! Tracing subscriber setup

use crate::settings::RunMode;
use anyhow::{anyhow, Result};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// run mode's default level.
pub fn init(mode: RunMode) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(mode)));

    let builder = FmtSubscriber::builder().with_env_filter(filter);
    let installed = match mode {
        RunMode::Local => tracing::subscriber::set_global_default(builder.pretty().finish()),
        RunMode::Prod => tracing::subscriber::set_global_default(
            builder.json().with_current_span(false).finish(),
        ),
    };
    installed.map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}

fn default_directive(mode: RunMode) -> &'static str {
    match mode {
        RunMode::Local => "debug",
        RunMode::Prod => "info",
    }
}
