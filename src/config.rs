//! Configuration loading and validation
//!
//! Every section has defaults, so a partial YAML file (or none at all) is
//! a valid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::{DEFAULT_GENERATIONS_PER_STEP, DEFAULT_RATE_WINDOW, DEFAULT_TARGET_STEPS_PER_SECOND};
use crate::domain::Algorithm;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid config value: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub evolution: EvolutionConfig,
    #[serde(default)]
    pub hashlife: HashLifeConfig,
    #[serde(default)]
    pub viewer: ViewerConfig,
}

/// Evolution pacing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub generations_per_step: u32,
    pub target_steps_per_second: f64,
    pub algorithm: Algorithm,
    /// Ticks in the rolling rate average
    pub rate_window: usize,
}

/// HashLife memory bound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HashLifeConfig {
    /// Canonical node count above which the memo tables are flushed
    pub max_cache_entries: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub cell_size: f32,
    pub window_width: i32,
    pub window_height: i32,
    /// Fraction of cells set alive by the randomize action
    pub random_density: f64,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            generations_per_step: DEFAULT_GENERATIONS_PER_STEP,
            target_steps_per_second: DEFAULT_TARGET_STEPS_PER_SECOND,
            algorithm: Algorithm::default(),
            rate_window: DEFAULT_RATE_WINDOW,
        }
    }
}

impl Default for HashLifeConfig {
    fn default() -> Self {
        Self {
            max_cache_entries: 1_000_000,
        }
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            cell_size: 10.0,
            window_width: 1000,
            window_height: 800,
            random_density: 0.3,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: &str| Err(ConfigError::Invalid(message.to_string()));

        if self.evolution.generations_per_step == 0 {
            return invalid("generations_per_step must be at least 1");
        }
        let rate = self.evolution.target_steps_per_second;
        if !rate.is_finite() || rate <= 0.0 {
            return invalid("target_steps_per_second must be a positive number");
        }
        if self.evolution.rate_window == 0 {
            return invalid("rate_window must be at least 1");
        }
        if self.hashlife.max_cache_entries == 0 {
            return invalid("max_cache_entries must be at least 1");
        }
        if !self.viewer.cell_size.is_finite() || self.viewer.cell_size <= 0.0 {
            return invalid("cell_size must be positive");
        }
        if self.viewer.window_width <= 0 || self.viewer.window_height <= 0 {
            return invalid("window dimensions must be positive");
        }
        if !(0.0..=1.0).contains(&self.viewer.random_density) {
            return invalid("random_density must be between 0 and 1");
        }
        Ok(())
    }
}
