//! Process settings from environment (and `.env` when present).

use crate::config::loader::DEFAULT_DB_SCHEMA;
use crate::error::ConfigError;
use std::path::PathBuf;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

#[derive(Clone, Debug)]
pub struct Settings {
    /// `DATABASE_URL`. When absent the in-memory store is used.
    pub database_url: Option<String>,
    /// `SCHEMA_PATH`. When absent the schema is introspected from the database.
    pub schema_path: Option<PathBuf>,
    /// `DATABASE_SCHEMA`, the PostgreSQL schema holding the tables.
    pub db_schema: String,
    pub bind_addr: String,
    pub max_connections: u32,
    pub body_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_url: None,
            schema_path: None,
            db_schema: DEFAULT_DB_SCHEMA.into(),
            bind_addr: DEFAULT_BIND_ADDR.into(),
            max_connections: 5,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Settings::default();
        let settings = Settings {
            database_url: get("DATABASE_URL").filter(|s| !s.is_empty()),
            schema_path: get("SCHEMA_PATH").filter(|s| !s.is_empty()).map(PathBuf::from),
            db_schema: get("DATABASE_SCHEMA").unwrap_or(defaults.db_schema),
            bind_addr: get("BIND_ADDR").unwrap_or(defaults.bind_addr),
            max_connections: parse_or("MAX_CONNECTIONS", get("MAX_CONNECTIONS"), defaults.max_connections)?,
            body_limit: parse_or("BODY_LIMIT_BYTES", get("BODY_LIMIT_BYTES"), defaults.body_limit)?,
        };
        if settings.database_url.is_none() && settings.schema_path.is_none() {
            return Err(ConfigError::Validation(
                "either DATABASE_URL or SCHEMA_PATH must be set".into(),
            ));
        }
        Ok(settings)
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(s) => s
            .trim()
            .parse()
            .map_err(|_| ConfigError::Validation(format!("{} must be a number, got '{}'", key, s))),
    }
}
