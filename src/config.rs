//! Runtime configuration: roster location, reference level and worker count.
//! Defaults can be overridden through `BUFFSHEET_*` environment variables.

use std::env;
use std::path::PathBuf;

use tracing::warn;

use crate::data::DEFAULT_ROSTER_PATH;
use crate::error::{BuffSheetError, Result};

/// Level the sheet evaluates buffs at when none is given.
pub const DEFAULT_LEVEL: i64 = 37;

pub const ROSTER_ENV: &str = "BUFFSHEET_ROSTER";
pub const LEVEL_ENV: &str = "BUFFSHEET_LEVEL";
pub const WORKERS_ENV: &str = "BUFFSHEET_WORKERS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetConfig {
    pub roster_path: PathBuf,
    pub level: i64,
    /// 0 means the Rayon default.
    pub workers: usize,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            roster_path: PathBuf::from(DEFAULT_ROSTER_PATH),
            level: DEFAULT_LEVEL,
            workers: 0,
        }
    }
}

impl SheetConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unparsable values keep the default and log a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(path) = lookup(ROSTER_ENV).filter(|p| !p.trim().is_empty()) {
            config.roster_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup(LEVEL_ENV) {
            match parse_setting::<i64>(LEVEL_ENV, &raw) {
                Ok(level) => config.level = level,
                Err(err) => warn!("{err}, defaulting to {}", config.level),
            }
        }
        if let Some(raw) = lookup(WORKERS_ENV) {
            match parse_setting::<usize>(WORKERS_ENV, &raw) {
                Ok(workers) => config.workers = workers,
                Err(err) => warn!("{err}, defaulting to {}", config.workers),
            }
        }
        config
    }
}

pub fn parse_setting<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| BuffSheetError::InvalidConfig {
            key: key.to_string(),
            value: raw.to_string(),
        })
}
