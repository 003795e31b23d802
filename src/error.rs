// src/error.rs

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors that abort a whole run. Per-item forecasting failures are not in here;
/// they are isolated by the pipeline and reported as skipped items.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("i/o failure on `{path}`: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("csv failure: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid demand distribution for item {item_id}: {reason}")]
    Distribution { item_id: u32, reason: String },
}

impl AppError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}
