//! Default values for every configuration key.

use std::path::PathBuf;
use std::time::Duration;

use super::settings::{ConfigFile, EnrichmentSettings, LoggingSettings, SessionSettings};
use crate::location::SessionOptions;
use crate::logging::{DEFAULT_LOG_DIR, DEFAULT_LOG_FILE};

/// Default enrichment window in seconds.
pub const DEFAULT_ENRICHMENT_WINDOW_SECS: u64 = 5;

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            session: SessionSettings {
                options: SessionOptions::default(),
            },
            enrichment: EnrichmentSettings {
                enabled: true,
                window: Duration::from_secs(DEFAULT_ENRICHMENT_WINDOW_SECS),
            },
            logging: LoggingSettings {
                directory: PathBuf::from(DEFAULT_LOG_DIR),
                file: DEFAULT_LOG_FILE.to_string(),
            },
        }
    }
}
