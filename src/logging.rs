//! Tracing subscriber setup.
//!
//! The filter comes from `ZH_LOG` when set, otherwise from `logging.level`.
//! Output goes to stderr, or to `logging.file` through a non-blocking writer.

use color_eyre::{eyre::eyre, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

pub const LOG_ENV: &str = "ZH_LOG";

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
  match std::env::var(LOG_ENV) {
    Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(&directives)
      .map_err(|e| eyre!("Invalid {} filter '{}': {}", LOG_ENV, directives, e)),
    _ => EnvFilter::try_new(&config.level)
      .map_err(|e| eyre!("Invalid logging.level '{}': {}", config.level, e)),
  }
}

/// Install the global subscriber.
///
/// The returned guard flushes file output on drop and must be held until exit.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
  let filter = build_filter(config)?;

  let Some(path) = &config.file else {
    tracing_subscriber::fmt()
      .with_env_filter(filter)
      .with_writer(std::io::stderr)
      .with_target(false)
      .try_init()
      .map_err(|e| eyre!("Failed to initialise logging: {}", e))?;
    return Ok(None);
  };

  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent)
      .map_err(|e| eyre!("Failed to create log directory {}: {}", parent.display(), e))?;
  }
  let file = std::fs::OpenOptions::new()
    .create(true)
    .append(true)
    .open(path)
    .map_err(|e| eyre!("Failed to open log file {}: {}", path.display(), e))?;

  let (writer, guard) = tracing_appender::non_blocking(file);
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(false)
    .try_init()
    .map_err(|e| eyre!("Failed to initialise logging: {}", e))?;

  Ok(Some(guard))
}
