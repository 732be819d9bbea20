// Runtime settings, read from `.env` and the process environment.

use std::path::PathBuf;
use thiserror::Error;

pub const DATA_DIR_VAR: &str = "WAYFINDER_DATA_DIR";
pub const LOG_VAR: &str = "WAYFINDER_LOG";

const DEFAULT_DATA_DIR: &str = ".wayfinder";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is set but empty")]
    Empty(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Directory holding one JSON document per stored collection.
    pub data_dir: PathBuf,
    /// `tracing` filter used when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is fine.
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &'static str, default: &str| match lookup(key) {
            Some(value) if value.trim().is_empty() => Err(ConfigError::Empty(key)),
            Some(value) => Ok(value),
            None => Ok(default.to_string()),
        };
        Ok(Self {
            data_dir: PathBuf::from(read(DATA_DIR_VAR, DEFAULT_DATA_DIR)?),
            log_filter: read(LOG_VAR, DEFAULT_LOG_FILTER)?,
        })
    }

    pub fn with_data_dir(mut self, data_dir: Option<PathBuf>) -> Self {
        if let Some(data_dir) = data_dir {
            self.data_dir = data_dir;
        }
        self
    }
}
