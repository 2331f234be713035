//! Configuration file loader
//! Layers the configuration file with `SCAVENGER_*` environment overrides

use ::config::{Config, Environment, File};
use std::path::Path;
use tracing::info;

use super::AppConfig;
use crate::error::ScavengerError;

const ENV_PREFIX: &str = "SCAVENGER";

impl AppConfig {
    /// Load and validate the configuration. The file format (YAML, TOML, JSON)
    /// is inferred from the extension. Environment variables such as
    /// `SCAVENGER_BOT__CONCURRENT_SIZE=8` override file values.
    pub fn load(path: &Path) -> Result<Self, ScavengerError> {
        info!("Loading configuration from: {:?}", path);

        if !path.exists() {
            return Err(ScavengerError::ConfigError(format!(
                "Configuration file not found: {:?}",
                path
            )));
        }

        let settings = Config::builder()
            .add_source(File::from(path))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app_config: AppConfig = settings.try_deserialize()?;
        app_config.validate()?;

        info!(
            "Configuration loaded: {} repository tokens, {} excluded",
            app_config.bot.repos.len(),
            app_config.bot.excluded_repos.len()
        );

        Ok(app_config)
    }
}
