use thiserror::Error;

/// Represents all possible errors that can occur when loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Occurs when the configuration file cannot be found at the specified path.
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Wraps errors from the `config` crate when loading or parsing the configuration.
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    /// Occurs when configuration values fail validation.
    #[error("Configuration validation error: {0}")]
    ValidationError(String),

    /// Occurs when the tracing subscriber cannot be installed (e.g. one is
    /// already set, or the log directory cannot be created).
    #[error("Failed to initialize tracing: {0}")]
    TracingInit(String),
}

impl ConfigError {
    /// Creates a new validation error with a formatted message.
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::ValidationError(msg.into())
    }
}
