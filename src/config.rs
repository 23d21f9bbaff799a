// ⚙️ Configuration - environment driven
// Reads SILK_* variables (a .env file is honoured by the binaries via dotenvy)

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use strum_macros::{Display, EnumString};
use thiserror::Error;

pub const DEFAULT_DATABASE_PATH: &str = "silk-progress.db";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_STATIC_DIR: &str = "web";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },
}

/// Deployment environment. Controls error logging detail and whether the
/// maintenance endpoints are reachable at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Default)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub bind_addr: String,
    pub environment: Environment,
    pub static_dir: PathBuf,
}

impl Config {
    /// Build configuration from `SILK_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("SILK_ENV") {
            Ok(value) => Environment::from_str(value.trim()).map_err(|_| ConfigError::InvalidValue {
                var: "SILK_ENV",
                value,
            })?,
            Err(_) => Environment::default(),
        };

        let bind_addr = env::var("SILK_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        if bind_addr.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                var: "SILK_BIND_ADDR",
                value: bind_addr,
            });
        }

        Ok(Config {
            database_path: env::var("SILK_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATABASE_PATH)),
            bind_addr,
            environment,
            static_dir: env::var("SILK_STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_STATIC_DIR)),
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    /// Seeding and ad hoc queries are never served in production.
    pub fn maintenance_enabled(&self) -> bool {
        self.environment != Environment::Production
    }

    /// Default `tracing` filter when RUST_LOG is not set.
    pub fn default_log_filter(&self) -> &'static str {
        match self.environment {
            Environment::Development => "silk_progress=debug,silk_server=debug,tower_http=debug",
            Environment::Production | Environment::Test => "info",
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            environment: Environment::Development,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
        }
    }
}
