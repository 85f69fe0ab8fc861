//! Interfaces to the host platform.
//!
//! The coordinator never talks to sensors or OS services directly. Everything
//! it consumes goes through these traits:
//!
//! - [`PushSource`] - per-provider update subscriptions and last-known readings
//! - [`LocationListener`] - callback sink the push source notifies
//! - [`ProviderCatalog`] - provider enumeration, enabled state and capabilities
//! - [`ServiceAvailability`] - global location switch
//! - [`EnrichmentSource`] - auxiliary satellite metadata
//!
//! [`SimulatedPlatform`](super::simulator::SimulatedPlatform) implements all of
//! them in memory.

use std::sync::Arc;
use std::time::Duration;

use super::accuracy::ProviderCapabilities;
use super::reading::{ProviderId, Reading, SatelliteMetadata};

/// Status a provider reports through the legacy status callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderStatus {
    /// Provider is producing fixes.
    Available,
    /// Provider expects to recover shortly (ignored).
    TemporarilyUnavailable,
    /// Provider is gone until re-enabled.
    OutOfService,
}

/// Parameters of a single provider subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionRequest {
    /// Provider to receive readings from.
    pub provider: ProviderId,

    /// Minimum time between updates.
    pub min_interval: Duration,

    /// Minimum distance (meters) between updates.
    pub min_distance: f32,
}

/// Receiver of push-source notifications.
///
/// Implementations must tolerate being called from any thread, concurrently.
pub trait LocationListener: Send + Sync {
    /// A new reading arrived from a subscribed provider.
    fn on_reading(&self, reading: Reading);

    /// A provider was switched on.
    fn on_provider_enabled(&self, provider: &ProviderId);

    /// A provider was switched off.
    fn on_provider_disabled(&self, provider: &ProviderId);

    /// Legacy status notification; maps onto enabled/disabled.
    fn on_status_changed(&self, provider: &ProviderId, status: ProviderStatus) {
        match status {
            ProviderStatus::Available => self.on_provider_enabled(provider),
            ProviderStatus::OutOfService => self.on_provider_disabled(provider),
            ProviderStatus::TemporarilyUnavailable => {}
        }
    }
}

/// Source of position updates.
///
/// `unsubscribe` removes every subscription registered for the listener and is
/// expected to take effect immediately. Late callbacks are still tolerated by
/// the coordinator.
pub trait PushSource: Send + Sync {
    /// Start delivering updates for one provider to the listener.
    fn subscribe(&self, request: &SubscriptionRequest, listener: Arc<dyn LocationListener>);

    /// Stop delivering updates to the listener.
    fn unsubscribe(&self, listener: &Arc<dyn LocationListener>);

    /// Last reading the provider cached, if any.
    fn last_known_reading(&self, provider: &ProviderId) -> Option<Reading>;
}

/// Provider enumeration and properties.
pub trait ProviderCatalog: Send + Sync {
    /// All providers in platform enumeration order.
    ///
    /// With `include_disabled == false` only currently enabled providers are returned.
    fn available_providers(&self, include_disabled: bool) -> Vec<ProviderId>;

    /// Whether the provider is currently enabled.
    fn is_provider_enabled(&self, provider: &ProviderId) -> bool;

    /// Accuracy and power characteristics, if the platform publishes them.
    fn capabilities(&self, provider: &ProviderId) -> Option<ProviderCapabilities>;
}

/// Global location service switch.
pub trait ServiceAvailability: Send + Sync {
    fn is_enabled(&self) -> bool;
}

/// Auxiliary satellite metadata feed.
pub trait EnrichmentSource: Send + Sync {
    fn start(&self);

    fn stop(&self);

    /// Most recent metadata pushed since `start`.
    fn latest_metadata(&self) -> Option<SatelliteMetadata>;
}

/// The platform's location manager: push source plus provider catalog.
#[derive(Clone)]
pub struct LocationManager {
    pub push_source: Arc<dyn PushSource>,
    pub catalog: Arc<dyn ProviderCatalog>,
}

impl LocationManager {
    pub fn new(push_source: Arc<dyn PushSource>, catalog: Arc<dyn ProviderCatalog>) -> Self {
        Self {
            push_source,
            catalog,
        }
    }
}

/// Everything the session controller needs from the host.
#[derive(Clone)]
pub struct PlatformServices {
    /// `None` when the host has no location manager at all.
    pub location_manager: Option<LocationManager>,

    pub service: Arc<dyn ServiceAvailability>,

    pub enrichment: Option<Arc<dyn EnrichmentSource>>,
}
