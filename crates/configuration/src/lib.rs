use crate::error::ConfigError;
use crate::settings::Config;

pub mod error;
#[cfg(feature = "clap")]
pub mod cli;
pub mod logging;
pub mod settings;

pub use settings::{
    BotConfig, Config, ExitConfig, GridParams, LoggingConfig, MeanReversionParams,
    MomentumParams, NotificationConfig, ReconciliationConfig, RiskManagement, RouterConfig,
    ScalpingParams, Strategies,
};

pub use logging::init_tracing;

#[cfg(feature = "clap")]
pub use cli::{Cli, Commands};

/// Loads the application configuration from `config.toml`, layering in
/// environment overrides (`APP__bot__dry_run_mode=true` style) on top.
pub fn load_config() -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name("config.toml"))
        .add_source(config::Environment::with_prefix("APP").separator("__"))
        .build()?;

    builder.try_deserialize::<Config>().map_err(ConfigError::from)
}
