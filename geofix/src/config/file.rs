//! Configuration file loading.
//!
//! Settings structs live in [`super::settings`], defaults in [`super::defaults`],
//! and key parsing in [`super::parser`].

use std::path::Path;

use ini::Ini;
use thiserror::Error;

use super::settings::ConfigFile;
use crate::location::ControllerConfig;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read or parse config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigFile {
    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Parse configuration from INI text.
    pub fn from_ini_str(text: &str) -> Result<Self, ConfigFileError> {
        let ini = Ini::load_from_str(text).map_err(ini::Error::Parse)?;
        super::parser::parse_ini(&ini)
    }

    /// Session controller settings derived from `[enrichment]`.
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            enrichment_enabled: self.enrichment.enabled,
            enrichment_window: self.enrichment.window,
        }
    }
}
