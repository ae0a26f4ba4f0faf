//! User configuration (`<config dir>/joymap/config.toml`).
//!
//! ```toml
//! poll_interval_ms = 20
//! digital_heuristic = false
//!
//! [default_mapping]
//! prefer = "hat"   # or "dpad"
//! ```
//!
//! Every key is optional. A missing file means all defaults; a file that does
//! not parse is an error rather than being silently replaced.

use crate::calibration::DigitalPolicy;
use crate::default_map::DirectionalPreference;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Sleep between polls (default: 20)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Treat axes with zero fuzz/flat/resolution as digital (default: false)
    #[serde(default)]
    pub digital_heuristic: bool,
    #[serde(default)]
    pub default_mapping: DefaultMappingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultMappingConfig {
    /// Hat or D-pad first when a device has both (default: hat)
    #[serde(default)]
    pub prefer: DirectionalPreference,
}

fn default_poll_interval_ms() -> u64 {
    20
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            digital_heuristic: false,
            default_mapping: DefaultMappingConfig::default(),
        }
    }
}

impl Config {
    /// `<config dir>/joymap/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("joymap").join("config.toml"))
    }

    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write to `path`, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = toml::to_string_pretty(self)?;
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(path, text).map_err(write_err)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn digital_policy(&self) -> DigitalPolicy {
        DigitalPolicy {
            zero_metadata_heuristic: self.digital_heuristic,
        }
    }
}
