use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Send `tracing` output to a daily log file under `log_dir`. The terminal
/// belongs to the UI, so nothing is written to stdout. `RUST_LOG` overrides
/// `default_level` when set.
pub fn init_logging(log_dir: &Path, default_level: &str) -> Result<()> {
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("lease-navigator")
        .filename_suffix("log")
        .build(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_level)
            .with_context(|| format!("invalid log level '{default_level}'"))?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_target(true)
                .with_level(true)
                .with_ansi(false),
        )
        .try_init()
        .context("failed to install log subscriber")?;

    Ok(())
}
