//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing logic.

use std::path::PathBuf;
use std::time::Duration;

use crate::location::SessionOptions;

/// Complete configuration loaded from an INI file.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Default options for new tracking sessions
    pub session: SessionSettings,
    /// Satellite metadata enrichment
    pub enrichment: EnrichmentSettings,
    /// Logging output
    pub logging: LoggingSettings,
}

/// `[session]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    /// Accuracy tier, update interval and distance filter
    pub options: SessionOptions,
}

/// `[enrichment]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentSettings {
    /// Start the satellite metadata feed with each session
    pub enabled: bool,
    /// Maximum age difference between a reading and its metadata
    pub window: Duration,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log directory
    pub directory: PathBuf,
    /// Log file name inside `directory`
    pub file: String,
}
