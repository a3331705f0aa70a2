//! Configuration module with business-specific sub-modules
//!
//! This module organizes configuration into logical areas:
//! - `auth` - bearer token verification settings
//! - `database` - storage backend and connection pool configuration
//! - `environment` - environment detection and logging configuration
//! - `lifecycle` - pricing, provider deadlines, polling and audit settings
//! - `provider` - SMS number provider selection and credentials
//! - `server` - HTTP server configuration

pub mod auth;
pub mod database;
pub mod environment;
pub mod lifecycle;
pub mod provider;
pub mod server;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use auth::AuthConfig;
pub use database::{DatabaseConfig, StorageBackend};
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use lifecycle::{LifecycleConfig, PollingConfig};
pub use provider::{ProviderConfig, ProviderKind};
pub use server::ServerConfig;

/// Prefix for environment variable overrides (`SV__SERVER__PORT=9000`)
pub const ENV_PREFIX: &str = "SV";

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub provider: ProviderConfig,
    pub lifecycle: LifecycleConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::for_environment(Environment::default())
    }
}

impl AppConfig {
    /// Baseline configuration for an environment before file and env overrides
    pub fn for_environment(environment: Environment) -> Self {
        let mut config = Self {
            environment,
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            provider: ProviderConfig::default(),
            lifecycle: LifecycleConfig::default(),
            auth: AuthConfig::default(),
            logging: LoggingConfig::for_environment(environment),
        };

        if environment.is_production() {
            config.database.backend = StorageBackend::MySql;
            config.database.max_connections = 50;
            config.provider.kind = ProviderKind::TextVerified;
        }

        config
    }

    /// Load configuration for the current process
    ///
    /// Sources, lowest precedence first:
    /// 1. `.env` file (via dotenvy) feeding the process environment
    /// 2. built-in defaults for the detected [`Environment`]
    /// 3. optional `config.<environment>.toml` in the working directory
    /// 4. `SV__`-prefixed environment variables, `__` separating sections
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = Environment::from_env();
        let defaults = Self::for_environment(environment);

        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&defaults)?)
            .add_source(config::File::with_name(&environment.config_file()).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let loaded: Self = settings.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject combinations that would make the server misbehave at runtime
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.environment.is_production() && self.auth.jwt_secret == AuthConfig::DEVELOPMENT_SECRET {
            return Err(ConfigError::Invalid(
                "auth.jwt_secret must be set in production".to_string(),
            ));
        }

        if self.provider.kind == ProviderKind::TextVerified
            && (self.provider.api_key.is_empty() || self.provider.api_username.is_empty())
        {
            return Err(ConfigError::Invalid(
                "provider.api_key and provider.api_username are required for textverified".to_string(),
            ));
        }

        self.lifecycle.validate().map_err(ConfigError::Invalid)?;

        Ok(())
    }
}
