// src/config.rs

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::simulation::config::SimulationConfig;
use crate::strategy::forecasting::ForecastConfig;
use crate::strategy::optimization::ReorderConfig;
use crate::telemetry::LoggingConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { dir: PathBuf::from("out") }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub simulation: SimulationConfig,
    pub forecast: ForecastConfig,
    pub reorder: ReorderConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub seed: Option<u64>,
    pub items: Option<u32>,
    pub days: Option<u32>,
    pub output_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl AppConfig {
    /// Defaults, then the TOML file (if any), then overrides, then validation.
    pub fn load(path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
        Self::from_toml(&raw)
            .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
    }

    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(seed) = overrides.seed {
            self.simulation.seed = seed;
        }
        if let Some(items) = overrides.items {
            self.simulation.items = items;
        }
        if let Some(days) = overrides.days {
            self.simulation.days = days;
        }
        if let Some(dir) = overrides.output_dir {
            self.output.dir = dir;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulation.validate()?;
        self.forecast.validate()?;
        self.reorder.validate()
    }
}
