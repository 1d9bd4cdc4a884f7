use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::ConfigError;

const DEFAULT_BUILD_CONFIG_YAML: &str = include_str!("../config/build.default.yaml");

/// Tuning for tree builds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub chunk_size: usize,
    pub snapshot_every: usize,
    pub max_depth: usize,
    pub min_games: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            chunk_size: 10,
            snapshot_every: 5,
            max_depth: 16,
            min_games: 1,
        }
    }
}

impl BuildConfig {
    /// Parse a build config from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: BuildConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a build config from a YAML file path.
    pub fn from_yaml_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let yaml = fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Return the default YAML config included with this crate.
    pub fn default_yaml() -> &'static str {
        DEFAULT_BUILD_CONFIG_YAML
    }

    /// Parse the default YAML config included with this crate.
    pub fn from_default_yaml() -> Result<Self, ConfigError> {
        Self::from_yaml_str(Self::default_yaml())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        if self.snapshot_every == 0 {
            return Err(ConfigError::Invalid(
                "snapshot_every must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
