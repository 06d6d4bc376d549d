use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::episode::Thresholds;
use crate::error::{FobError, Result};

pub const CONFIG_ENV: &str = "FOB_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cohort size used when a worksheet is read outside a project.
    pub default_animals: Option<usize>,
    pub thresholds: Thresholds,
}

impl Config {
    /// Loads `path`, falling back to `FOB_CONFIG`. With neither set the
    /// built-in defaults apply.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => std::env::var_os(CONFIG_ENV).map(PathBuf::from),
        };

        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(&path).map_err(|e| {
            FobError::Config(format!(
                "failed to read config file '{}': {e}",
                path.display()
            ))
        })?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), ?config, "config loaded");
        Ok(config)
    }

    /// Parses and validates a config; threshold bands must be finite with
    /// `low <= high`.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.thresholds.validate()?;
        Ok(config)
    }
}
