//! Sales API configuration module.
//!
//! Configuration is layered, later sources overriding earlier ones:
//!
//! 1. Built-in defaults
//! 2. Optional `tally.toml` in the working directory
//! 3. Environment variables prefixed `TALLY_`
//!
//! | Key               | Environment              | Default             |
//! |-------------------|--------------------------|---------------------|
//! | `port`            | `TALLY_PORT`             | `8080`              |
//! | `bind_addr`       | `TALLY_BIND_ADDR`        | `0.0.0.0`           |
//! | `database_path`   | `TALLY_DATABASE_PATH`    | `./tally.db`        |
//! | `max_connections` | `TALLY_MAX_CONNECTIONS`  | `5`                 |
//! | `log_filter`      | `TALLY_LOG_FILTER`       | `info,sqlx=warn`    |
//!
//! `RUST_LOG`, when set, wins over `log_filter`.

use std::net::{IpAddr, SocketAddr};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// File stem looked up when no other file is given.
pub const DEFAULT_CONFIG_FILE: &str = "tally";

/// Sales API configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// HTTP listen port
    pub port: u16,

    /// Interface to bind
    pub bind_addr: String,

    /// SQLite database file
    pub database_path: String,

    /// Pool size
    pub max_connections: u32,

    /// `tracing_subscriber::EnvFilter` directives
    pub log_filter: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            port: 8080,
            bind_addr: "0.0.0.0".to_string(),
            database_path: "./tally.db".to_string(),
            max_connections: 5,
            log_filter: "info,sqlx=warn".to_string(),
        }
    }
}

impl ApiConfig {
    /// Load configuration from `tally.toml` (if present) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load configuration using `file` as the optional config file.
    ///
    /// `file` may be a stem (`"tally"`, any supported extension) or a full
    /// path with extension.
    pub fn load_from(file: &str) -> Result<Self, ConfigError> {
        let defaults = ApiConfig::default();

        let config: ApiConfig = Config::builder()
            .set_default("port", defaults.port as i64)?
            .set_default("bind_addr", defaults.bind_addr)?
            .set_default("database_path", defaults.database_path)?
            .set_default("max_connections", defaults.max_connections as i64)?
            .set_default("log_filter", defaults.log_filter)?
            .add_source(File::with_name(file).required(false))
            .add_source(Environment::with_prefix("TALLY").try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Rejects values the server cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue("port".to_string()));
        }

        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("max_connections".to_string()));
        }

        if self.database_path.trim().is_empty() {
            return Err(ConfigError::MissingRequired("database_path".to_string()));
        }

        self.socket_addr().map(|_| ())
    }

    /// Address the HTTP listener binds to.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .bind_addr
            .parse()
            .map_err(|_| ConfigError::InvalidValue("bind_addr".to_string()))?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ApiConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.socket_addr().unwrap().port(), 8080);
    }

    #[test]
    fn test_rejects_zero_port_and_pool() {
        let config = ApiConfig {
            port: 0,
            ..ApiConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(key)) if key == "port"));

        let config = ApiConfig {
            max_connections: 0,
            ..ApiConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue(key)) if key == "max_connections"
        ));
    }

    #[test]
    fn test_rejects_bad_bind_addr() {
        let config = ApiConfig {
            bind_addr: "localhost:80".to_string(),
            ..ApiConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(key)) if key == "bind_addr"));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let path = std::env::temp_dir().join(format!("tally-config-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "port = 9191\ndatabase_path = \"/tmp/sales.db\"\n").unwrap();

        let config = ApiConfig::load_from(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.port, 9191);
        assert_eq!(config.database_path, "/tmp/sales.db");
        assert_eq!(config.max_connections, 5);
    }
}
