use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the log filter, e.g. `FLICK_LOG=debug`.
pub const LOG_ENV: &str = "FLICK_LOG";

pub fn log_dir() -> Option<PathBuf> {
  ProjectDirs::from("", "", "flick").map(|dirs| dirs.data_local_dir().join("logs"))
}

/// Route `tracing` output to `flick.log` in the data dir.
///
/// The terminal belongs to the UI, so nothing is written to stderr. Keep the
/// returned guard alive until exit or buffered lines are lost.
pub fn init_logging() -> Result<WorkerGuard> {
  let dir = log_dir().context("Could not determine a log directory")?;
  std::fs::create_dir_all(&dir).with_context(|| format!("Failed to create log directory {}", dir.display()))?;

  let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(&dir, "flick.log"));
  let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

  tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().with_writer(writer).with_ansi(false).with_target(false))
    .try_init()
    .context("Failed to install tracing subscriber")?;

  Ok(guard)
}
