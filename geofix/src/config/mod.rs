//! INI configuration for geofix hosts.
//!
//! # Example
//!
//! ```
//! use geofix::config::ConfigFile;
//! use geofix::location::AccuracyTier;
//!
//! let config = ConfigFile::from_ini_str("[session]\naccuracy = medium\n").unwrap();
//! assert_eq!(config.session.options.accuracy, AccuracyTier::Medium);
//! assert!(config.controller_config().enrichment_enabled);
//! ```

mod defaults;
mod file;
mod parser;
mod settings;

pub use defaults::DEFAULT_ENRICHMENT_WINDOW_SECS;
pub use file::ConfigFileError;
pub use settings::{ConfigFile, EnrichmentSettings, LoggingSettings, SessionSettings};
