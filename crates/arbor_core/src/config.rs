//! # Runtime Configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an empty
//! document is a valid configuration.
//!
//! ```toml
//! [pool]
//! capacity = 1000
//!
//! [ids]
//! zone = 3
//! epoch_ms = 1640995200000
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::id::{EPOCH_2022_MS, MASK_14_BIT};

/// Default number of recycled instances kept per type.
pub const DEFAULT_POOL_CAPACITY: usize = 1000;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The document is not valid TOML for this schema.
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Object pool settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum recycled instances queued per type; extra returns are dropped.
    pub capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_POOL_CAPACITY,
        }
    }
}

/// Identifier generator settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdConfig {
    /// Reserved zone field packed into business ids (14 bits).
    pub zone: u16,
    /// Reference epoch in Unix milliseconds for the id time field.
    pub epoch_ms: i64,
}

impl Default for IdConfig {
    fn default() -> Self {
        Self {
            zone: 0,
            epoch_ms: EPOCH_2022_MS,
        }
    }
}

/// Top-level runtime configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Object pool settings.
    pub pool: PoolConfig,
    /// Identifier generator settings.
    pub ids: IdConfig,
}

impl RuntimeConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise the
    /// same errors as [`RuntimeConfig::from_toml_str`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the zone does not fit in 14 bits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if u64::from(self.ids.zone) > MASK_14_BIT {
            return Err(ConfigError::Invalid(format!(
                "ids.zone {} exceeds 14 bits",
                self.ids.zone
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = RuntimeConfig::from_toml_str("").unwrap();
        assert_eq!(config, RuntimeConfig::default());
        assert_eq!(config.pool.capacity, 1000);
        assert_eq!(config.ids.epoch_ms, EPOCH_2022_MS);
    }

    #[test]
    fn test_partial_document() {
        let config = RuntimeConfig::from_toml_str("[ids]\nzone = 12\n").unwrap();
        assert_eq!(config.ids.zone, 12);
        assert_eq!(config.pool.capacity, DEFAULT_POOL_CAPACITY);
    }

    #[test]
    fn test_zone_out_of_range() {
        let err = RuntimeConfig::from_toml_str("[ids]\nzone = 20000\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_malformed_document() {
        let err = RuntimeConfig::from_toml_str("[pool\ncapacity = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = RuntimeConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
