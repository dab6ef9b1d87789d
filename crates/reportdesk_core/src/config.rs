//! Environment-driven configuration.
//!
//! # Responsibility
//! - Resolve data directory, storage name, actor, log level and
//!   text-generation settings from environment variables.
//!
//! # Invariants
//! - Every setting has a default except the API key, which stays optional.
//! - `.env` files are read only outside tests.

use crate::logging::default_log_level;
use crate::repo::snapshot_repo::DEFAULT_STORAGE_NAME;
use directories::ProjectDirs;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DATA_DIR: &str = "REPORTDESK_DATA_DIR";
pub const ENV_STORAGE_NAME: &str = "REPORTDESK_STORAGE_NAME";
pub const ENV_USER: &str = "REPORTDESK_USER";
pub const ENV_LOG_LEVEL: &str = "REPORTDESK_LOG_LEVEL";
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_MODEL: &str = "REPORTDESK_MODEL";
pub const ENV_GENERATION_TIMEOUT_SECS: &str = "REPORTDESK_GENERATION_TIMEOUT_SECS";

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 60;
const DB_FILE_NAME: &str = "reportdesk.sqlite3";
const LOG_DIR_NAME: &str = "logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { key: &'static str, details: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, details } => {
                write!(f, "invalid value for {key}: {details}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Text-generation collaborator settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_GENERATION_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDeskConfig {
    pub data_dir: PathBuf,
    pub storage_name: String,
    /// Actor to apply at startup; `None` keeps the persisted one.
    pub user: Option<String>,
    pub log_level: String,
    pub generation: GenerationConfig,
}

impl ReportDeskConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let data_dir = var(ENV_DATA_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);
        let storage_name = var(ENV_STORAGE_NAME).unwrap_or_else(|| DEFAULT_STORAGE_NAME.to_string());
        let log_level = var(ENV_LOG_LEVEL).unwrap_or_else(|| default_log_level().to_string());

        let timeout_secs = match var(ENV_GENERATION_TIMEOUT_SECS) {
            None => DEFAULT_GENERATION_TIMEOUT_SECS,
            Some(raw) => match raw.parse::<u64>() {
                Ok(0) => {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_GENERATION_TIMEOUT_SECS,
                        details: "must be greater than 0".to_string(),
                    })
                }
                Ok(value) => value,
                Err(err) => {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_GENERATION_TIMEOUT_SECS,
                        details: format!("`{raw}`: {err}"),
                    })
                }
            },
        };

        Ok(Self {
            data_dir,
            storage_name,
            user: var(ENV_USER),
            log_level,
            generation: GenerationConfig {
                api_key: var(ENV_API_KEY),
                base_url: var(ENV_BASE_URL).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                model: var(ENV_MODEL).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                timeout_secs,
            },
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join(LOG_DIR_NAME)
    }
}

fn default_data_dir() -> PathBuf {
    ProjectDirs::from("", "", "reportdesk")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".reportdesk"))
}
