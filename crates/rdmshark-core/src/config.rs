//! Decoder configuration.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Output detail level for packet records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    #[default]
    Off,
    On,
}

impl Verbosity {
    pub fn is_verbose(self) -> bool {
        matches!(self, Verbosity::On)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid verbosity '{0}': expected 'off' or 'on'")]
    InvalidVerbosity(String),
}

impl FromStr for Verbosity {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Verbosity::Off),
            "on" => Ok(Verbosity::On),
            _ => Err(ConfigError::InvalidVerbosity(value.to_string())),
        }
    }
}

impl std::fmt::Display for Verbosity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verbosity::Off => f.write_str("off"),
            Verbosity::On => f.write_str("on"),
        }
    }
}

/// Settings shared by the assembler and the analysis driver.
///
/// # Examples
/// ```
/// use rdmshark_core::{DecoderConfig, Verbosity};
///
/// let config = DecoderConfig::default();
/// assert_eq!(config.verbosity, Verbosity::Off);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderConfig {
    pub verbosity: Verbosity,
}

impl DecoderConfig {
    pub fn with_verbosity(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }
}
