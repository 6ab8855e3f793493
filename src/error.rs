use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced to callers of the data layer and the command line.
/// The buff engine itself never fails; it absorbs malformed records locally.
#[derive(Error, Debug)]
pub enum BuffSheetError {
    #[error("IO error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unsupported roster format '{0}' (expected .json, .yaml or .yml)")]
    UnsupportedFormat(String),

    #[error("unit not found in roster: {0}")]
    UnitNotFound(String),

    #[error("invalid value for {key}: '{value}'")]
    InvalidConfig { key: String, value: String },
}

pub type Result<T> = std::result::Result<T, BuffSheetError>;
