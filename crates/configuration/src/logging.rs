use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::ConfigError;
use crate::settings::LoggingConfig;

/// Installs the process-wide tracing subscriber: a console layer always on,
/// plus an optional daily-rolling file layer when `config.file_enabled`.
///
/// Returns the file appender's worker guard; the caller must keep it alive
/// for the process lifetime or buffered file writes are lost on exit.
pub fn init_tracing(
    config: &LoggingConfig,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>, ConfigError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

    let console_layer = fmt::layer().with_target(true);

    if !config.file_enabled {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .try_init()
            .map_err(|e| ConfigError::TracingInit(e.to_string()))?;
        return Ok(None);
    }

    std::fs::create_dir_all(&config.file_directory)
        .map_err(|e| ConfigError::TracingInit(e.to_string()))?;
    let file_appender = tracing_appender::rolling::daily(&config.file_directory, "engine.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = fmt::layer().with_ansi(false).with_writer(non_blocking);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| ConfigError::TracingInit(e.to_string()))?;

    Ok(Some(guard))
}
