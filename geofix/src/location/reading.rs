//! Core value types for position readings.
//!
//! - [`ProviderId`] - Identifier of a position source (`gps`, `network`, ...)
//! - [`Reading`] - Immutable position snapshot produced by a push source
//! - [`SatelliteMetadata`] - Auxiliary satellite data used to annotate readings

use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, Utc};

/// Identifier of a position provider.
///
/// Platforms name their providers freely, so this is a string newtype rather
/// than an enum. The well-known names are available as constants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProviderId(Cow<'static, str>);

impl ProviderId {
    /// Satellite-based, high-precision provider.
    pub const GPS: Self = Self(Cow::Borrowed("gps"));

    /// Coarse network-based provider (cell towers, Wi-Fi).
    pub const NETWORK: Self = Self(Cow::Borrowed("network"));

    /// Passive provider that piggybacks on other applications' requests.
    pub const PASSIVE: Self = Self(Cow::Borrowed("passive"));

    /// Fused provider offered by some platforms.
    pub const FUSED: Self = Self(Cow::Borrowed("fused"));

    /// Create a provider identifier from any string.
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// Get the provider name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProviderId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Satellite metadata pushed by the auxiliary enrichment source.
#[derive(Debug, Clone, PartialEq)]
pub struct SatelliteMetadata {
    /// When the metadata was captured.
    pub timestamp: DateTime<Utc>,

    /// Number of satellites currently visible.
    pub satellites_in_view: u32,

    /// Number of satellites used in the last fix.
    pub satellites_used: u32,

    /// Altitude above mean sea level in meters, if the receiver reported one.
    pub msl_altitude: Option<f64>,
}

/// A single position reading.
///
/// Readings are produced by the push source and never modified afterwards.
/// Annotation with [`SatelliteMetadata`] creates a new value.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// When the position was measured.
    pub timestamp: DateTime<Utc>,

    /// Accuracy radius in meters (lower is better).
    pub accuracy: f32,

    /// Latitude in degrees (-90 to 90).
    pub latitude: f64,

    /// Longitude in degrees (-180 to 180).
    pub longitude: f64,

    /// Provider that produced this reading.
    pub provider: ProviderId,

    /// Altitude in meters above the WGS84 ellipsoid.
    pub altitude: Option<f64>,

    /// Ground speed in meters per second.
    pub speed: Option<f32>,

    /// Bearing in degrees (0-360).
    pub heading: Option<f32>,

    /// Satellite metadata attached after acceptance.
    pub satellites: Option<SatelliteMetadata>,
}

impl Reading {
    /// Create a reading with the mandatory fields only.
    pub fn new(
        provider: ProviderId,
        latitude: f64,
        longitude: f64,
        accuracy: f32,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            timestamp,
            accuracy,
            latitude,
            longitude,
            provider,
            altitude: None,
            speed: None,
            heading: None,
            satellites: None,
        }
    }

    /// Return a copy with altitude set.
    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    /// Return a copy with speed and heading set.
    pub fn with_motion(mut self, speed: f32, heading: f32) -> Self {
        self.speed = Some(speed);
        self.heading = Some(heading);
        self
    }

    /// Return a copy annotated with satellite metadata.
    pub fn with_satellites(mut self, metadata: SatelliteMetadata) -> Self {
        self.satellites = Some(metadata);
        self
    }

    /// Position as (latitude, longitude).
    pub fn position(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}
