//! API server configuration.
//!
//! Layered with the `config` crate:
//!
//! ```text
//! built-in defaults  →  erp.toml (optional)  →  ERP_* environment variables
//! ```
//!
//! `ERP_PORT=9000`, `ERP_DATABASE_PATH=/var/lib/erp/erp.db`,
//! `ERP_JWT_SECRET=...` and so on override the file, which overrides the
//! defaults.

use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Secret used when nothing else is configured. Fine for local runs only.
pub const DEV_JWT_SECRET: &str = "erp-dev-secret-change-in-production";

/// Name of the optional configuration file (without extension).
pub const CONFIG_FILE: &str = "erp";

/// Prefix of the environment overrides.
pub const ENV_PREFIX: &str = "ERP";

/// API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Interface to bind
    pub host: String,

    /// HTTP port
    pub port: u16,

    /// SQLite database file, or `:memory:`
    pub database_path: String,

    /// Upper bound of the connection pool
    pub db_max_connections: u32,

    /// HS256 signing key for bearer tokens
    pub jwt_secret: String,

    /// Token lifetime in seconds (default: 24h)
    pub jwt_lifetime_secs: i64,

    /// Budget for one sale request, after which it is cancelled and rolled back
    pub sale_timeout_secs: u64,

    /// Create the admin user and sample catalogue on startup
    pub seed_defaults: bool,

    /// Password given to the seeded admin user
    pub admin_password: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_path: "erp.db".to_string(),
            db_max_connections: 10,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_lifetime_secs: 86_400,
            sale_timeout_secs: 10,
            seed_defaults: true,
            admin_password: "admin123".to_string(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from defaults, `erp.toml` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(
            Environment::with_prefix(ENV_PREFIX).try_parsing(true),
            Some(CONFIG_FILE),
        )
    }

    /// Loads configuration from an explicit environment source and optional
    /// file name.
    pub fn load_from(env: Environment, file: Option<&str>) -> Result<Self, ConfigError> {
        let defaults = ApiConfig::default();

        let mut builder = Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("database_path", defaults.database_path)?
            .set_default("db_max_connections", i64::from(defaults.db_max_connections))?
            .set_default("jwt_secret", defaults.jwt_secret)?
            .set_default("jwt_lifetime_secs", defaults.jwt_lifetime_secs)?
            .set_default("sale_timeout_secs", defaults.sale_timeout_secs as i64)?
            .set_default("seed_defaults", defaults.seed_defaults)?
            .set_default("admin_password", defaults.admin_password)?;

        if let Some(name) = file {
            builder = builder.add_source(File::with_name(name).required(false));
        }

        let config: ApiConfig = builder.add_source(env).build()?.try_deserialize()?;
        config.validate()?;

        if config.jwt_secret == DEV_JWT_SECRET {
            warn!("Using the development JWT secret; set ERP_JWT_SECRET in production");
        }

        Ok(config)
    }

    /// Checks value ranges the deserializer cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt_secret".to_string()));
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidValue("port".to_string()));
        }
        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("db_max_connections".to_string()));
        }
        if self.jwt_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("jwt_lifetime_secs".to_string()));
        }
        if self.sale_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue("sale_timeout_secs".to_string()));
        }
        Ok(())
    }

    /// `host:port` for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
