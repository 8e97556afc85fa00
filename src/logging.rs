use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use crate::config::LoggingConfig;
use crate::utils::error::{AppError, Result};

/// Installs the global subscriber: stdout always, plus a plain-text file when
/// `logging.file` is set. `RUST_LOG` takes precedence over `logging.level`.
///
/// Keep the returned guard alive until exit or buffered file lines are lost.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = build_filter(config)?;

    let (file_layer, guard) = match config.file.as_deref().filter(|f| !f.trim().is_empty()) {
        Some(file) => {
            let (directory, file_name) = split_log_path(file)?;
            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .try_init()
        .map_err(|e| AppError::Internal(format!("Failed to set global default subscriber: {}", e)))?;

    Ok(guard)
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    EnvFilter::try_new(&config.level).map_err(|e| {
        AppError::Validation(format!("Invalid log level '{}': {}", config.level, e))
    })
}

fn split_log_path(file: &str) -> Result<(&Path, &str)> {
    let path = Path::new(file);
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| AppError::Validation(format!("Invalid log file path '{}'", file)))?;
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Ok((directory, file_name))
}
