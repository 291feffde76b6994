use std::path::PathBuf;

use thiserror::Error;

/// Longest daily series a single request may generate.
pub const MAX_DURATION_MONTHS: u32 = 120;
/// Days per month used when expanding a daily series.
pub const DAYS_PER_MONTH: i64 = 30;

pub const DEFAULT_WEEKS_COUNT: u32 = 4;
pub const MAX_CHECKBOOK_WEEKS: u32 = 52;

pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const MAX_PAGE_SIZE: u32 = 1000;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub db_path: PathBuf,
    pub base_path: String,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has invalid value {value:?}")]
    Invalid { var: &'static str, value: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_port = lookup("TASKBOOK_PORT").ok_or(ConfigError::Missing("TASKBOOK_PORT"))?;
        let port = raw_port.trim().parse().map_err(|_| ConfigError::Invalid {
            var: "TASKBOOK_PORT",
            value: raw_port.clone(),
        })?;

        let db_path = lookup("TASKBOOK_DB_PATH")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("tasks.db"));

        let base_path = lookup("TASKBOOK_BASE_PATH")
            .map(|path| normalize_base_path(&path))
            .unwrap_or_default();

        Ok(Config {
            port,
            db_path,
            base_path,
        })
    }
}

/// `api/` -> `/api`, `/` -> ``
pub fn normalize_base_path(path: &str) -> String {
    let path = path.trim().trim_end_matches('/');
    if path.is_empty() || path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}
