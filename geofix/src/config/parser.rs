//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use ini::Ini;

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::location::AccuracyTier;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [session] section
    if let Some(section) = ini.section(Some("session")) {
        if let Some(v) = section.get("accuracy") {
            config.session.options.accuracy = AccuracyTier::from_str(v).map_err(|_| {
                invalid(
                    "session",
                    "accuracy",
                    v,
                    "must be one of: lowest, low, medium, best, best_for_navigation",
                )
            })?;
        }
        if let Some(v) = section.get("time_interval_ms") {
            let ms: u64 = v.trim().parse().map_err(|_| {
                invalid(
                    "session",
                    "time_interval_ms",
                    v,
                    "must be a non-negative integer (milliseconds)",
                )
            })?;
            config.session.options.time_interval = Duration::from_millis(ms);
        }
        if let Some(v) = section.get("distance_filter_m") {
            config.session.options.distance_filter = v
                .trim()
                .parse::<f32>()
                .ok()
                .filter(|m| m.is_finite() && *m >= 0.0)
                .ok_or_else(|| {
                    invalid(
                        "session",
                        "distance_filter_m",
                        v,
                        "must be a non-negative number (meters)",
                    )
                })?;
        }
    }

    // [enrichment] section
    if let Some(section) = ini.section(Some("enrichment")) {
        if let Some(v) = section.get("enabled") {
            config.enrichment.enabled = parse_bool(v);
        }
        if let Some(v) = section.get("window_secs") {
            let secs: u64 = v.trim().parse().map_err(|_| {
                invalid(
                    "enrichment",
                    "window_secs",
                    v,
                    "must be a non-negative integer (seconds)",
                )
            })?;
            config.enrichment.window = Duration::from_secs(secs);
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.directory = PathBuf::from(v);
            }
        }
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if v.is_empty() || v.contains(['/', '\\']) {
                return Err(invalid(
                    "logging",
                    "file",
                    v,
                    "must be a plain file name",
                ));
            }
            config.logging.file = v.to_string();
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Parse a boolean value from a config string.
/// Accepts: true/false, yes/no, 1/0, on/off (case-insensitive)
pub(super) fn parse_bool(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "true" || v == "1" || v == "yes" || v == "on"
}
