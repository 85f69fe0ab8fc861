//! In-memory platform for tests and hardware-less hosts.
//!
//! [`SimulatedPlatform`] implements every collaborator trait from
//! [`platform`](super::platform) and records what the coordinator does with it:
//! active subscriptions, the highest number of simultaneous subscriptions, and
//! the full subscription history.
//!
//! Listener callbacks are always invoked after the internal lock is released,
//! so listeners may call back into the platform (subscribe/unsubscribe).
//!
//! # Example
//!
//! ```
//! use geofix::location::{ProviderId, SimulatedPlatform};
//!
//! let platform = SimulatedPlatform::new();
//! platform.add_provider(ProviderId::GPS, true, None);
//! platform.set_provider_enabled(&ProviderId::GPS, false);
//! assert!(platform.active_subscriptions().is_empty());
//! ```

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use super::accuracy::ProviderCapabilities;
use super::platform::{
    EnrichmentSource, LocationListener, LocationManager, PlatformServices, ProviderCatalog,
    ProviderStatus, PushSource, ServiceAvailability, SubscriptionRequest,
};
use super::reading::{ProviderId, Reading, SatelliteMetadata};

/// Unsubscribed listeners kept reachable for late-callback simulation.
pub const RETAINED_LISTENERS: usize = 8;

struct SimulatedProvider {
    id: ProviderId,
    enabled: bool,
    capabilities: Option<ProviderCapabilities>,
    last_known: Option<Reading>,
}

struct Subscription {
    request: SubscriptionRequest,
    listener: Arc<dyn LocationListener>,
}

struct SimulatorState {
    service_enabled: bool,
    providers: Vec<SimulatedProvider>,
    subscriptions: Vec<Subscription>,
    /// Most recently unsubscribed listeners, oldest first.
    retired_listeners: VecDeque<Arc<dyn LocationListener>>,
    history: Vec<SubscriptionRequest>,
    max_concurrent: usize,
    unsubscribe_calls: usize,
    enrichment_running: bool,
    enrichment_starts: usize,
    latest_metadata: Option<SatelliteMetadata>,
}

impl SimulatorState {
    fn provider(&self, id: &ProviderId) -> Option<&SimulatedProvider> {
        self.providers.iter().find(|p| p.id == *id)
    }

    fn provider_mut(&mut self, id: &ProviderId) -> Option<&mut SimulatedProvider> {
        self.providers.iter_mut().find(|p| p.id == *id)
    }

    /// Listeners with an active subscription, each once.
    fn active_listeners(&self) -> Vec<Arc<dyn LocationListener>> {
        let mut listeners: Vec<Arc<dyn LocationListener>> = Vec::new();
        for subscription in &self.subscriptions {
            if !listeners
                .iter()
                .any(|l| same_listener(l, &subscription.listener))
            {
                listeners.push(subscription.listener.clone());
            }
        }
        listeners
    }
}

fn same_listener(a: &Arc<dyn LocationListener>, b: &Arc<dyn LocationListener>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Simulated location platform. Clones share state.
#[derive(Clone)]
pub struct SimulatedPlatform {
    state: Arc<Mutex<SimulatorState>>,
}

impl Default for SimulatedPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedPlatform {
    /// Create a platform with location services on and no providers.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SimulatorState {
                service_enabled: true,
                providers: Vec::new(),
                subscriptions: Vec::new(),
                retired_listeners: VecDeque::new(),
                history: Vec::new(),
                max_concurrent: 0,
                unsubscribe_calls: 0,
                enrichment_running: false,
                enrichment_starts: 0,
                latest_metadata: None,
            })),
        }
    }

    /// Bundle this platform as the full set of host services.
    pub fn services(&self) -> PlatformServices {
        PlatformServices {
            location_manager: Some(LocationManager::new(
                Arc::new(self.clone()),
                Arc::new(self.clone()),
            )),
            service: Arc::new(self.clone()),
            enrichment: Some(Arc::new(self.clone())),
        }
    }

    /// Register a provider; enumeration order follows registration order.
    pub fn add_provider(
        &self,
        id: ProviderId,
        enabled: bool,
        capabilities: Option<ProviderCapabilities>,
    ) {
        let mut state = self.state.lock();
        match state.provider_mut(&id) {
            Some(existing) => {
                existing.enabled = enabled;
                existing.capabilities = capabilities;
            }
            None => state.providers.push(SimulatedProvider {
                id,
                enabled,
                capabilities,
                last_known: None,
            }),
        }
    }

    /// Switch the global location service on or off.
    pub fn set_service_enabled(&self, enabled: bool) {
        self.state.lock().service_enabled = enabled;
    }

    /// Toggle a provider and notify every subscribed listener.
    pub fn set_provider_enabled(&self, id: &ProviderId, enabled: bool) {
        let listeners = {
            let mut state = self.state.lock();
            if let Some(provider) = state.provider_mut(id) {
                provider.enabled = enabled;
            }
            state.active_listeners()
        };

        for listener in listeners {
            if enabled {
                listener.on_provider_enabled(id);
            } else {
                listener.on_provider_disabled(id);
            }
        }
    }

    /// Report a legacy status change to every subscribed listener.
    pub fn report_status(&self, id: &ProviderId, status: ProviderStatus) {
        let listeners = {
            let mut state = self.state.lock();
            if let Some(provider) = state.provider_mut(id) {
                match status {
                    ProviderStatus::Available => provider.enabled = true,
                    ProviderStatus::OutOfService => provider.enabled = false,
                    ProviderStatus::TemporarilyUnavailable => {}
                }
            }
            state.active_listeners()
        };

        for listener in listeners {
            listener.on_status_changed(id, status);
        }
    }

    /// Cache a reading as the provider's last known reading.
    pub fn set_last_known(&self, reading: Reading) {
        let mut state = self.state.lock();
        if let Some(provider) = state.provider_mut(&reading.provider) {
            provider.last_known = Some(reading);
        }
    }

    /// Deliver a reading to listeners subscribed to its provider.
    ///
    /// The reading also becomes the provider's last known reading.
    pub fn push_reading(&self, reading: Reading) {
        let listeners: Vec<Arc<dyn LocationListener>> = {
            let mut state = self.state.lock();
            if let Some(provider) = state.provider_mut(&reading.provider) {
                provider.last_known = Some(reading.clone());
            }
            state
                .subscriptions
                .iter()
                .filter(|s| s.request.provider == reading.provider)
                .map(|s| s.listener.clone())
                .collect()
        };

        for listener in listeners {
            listener.on_reading(reading.clone());
        }
    }

    /// Deliver a reading to every subscribed listener and to the last
    /// [`RETAINED_LISTENERS`] unsubscribed ones. Simulates callbacks racing an
    /// unsubscribe.
    pub fn deliver_to_all_listeners(&self, reading: Reading) {
        let listeners = {
            let state = self.state.lock();
            let mut listeners = state.active_listeners();
            for retired in &state.retired_listeners {
                if !listeners.iter().any(|l| same_listener(l, retired)) {
                    listeners.push(retired.clone());
                }
            }
            listeners
        };
        for listener in listeners {
            listener.on_reading(reading.clone());
        }
    }

    /// Publish satellite metadata on the enrichment feed.
    ///
    /// Ignored unless the feed has been started.
    pub fn push_metadata(&self, metadata: SatelliteMetadata) {
        let mut state = self.state.lock();
        if state.enrichment_running {
            state.latest_metadata = Some(metadata);
        }
    }

    /// Providers with an active subscription, in subscription order.
    pub fn active_subscriptions(&self) -> Vec<ProviderId> {
        self.state
            .lock()
            .subscriptions
            .iter()
            .map(|s| s.request.provider.clone())
            .collect()
    }

    /// Highest number of simultaneous subscriptions observed.
    pub fn max_concurrent_subscriptions(&self) -> usize {
        self.state.lock().max_concurrent
    }

    /// Every subscription request received, in order.
    pub fn subscription_history(&self) -> Vec<SubscriptionRequest> {
        self.state.lock().history.clone()
    }

    /// Number of `unsubscribe` calls received.
    pub fn unsubscribe_calls(&self) -> usize {
        self.state.lock().unsubscribe_calls
    }

    /// Whether the enrichment feed is running.
    pub fn enrichment_running(&self) -> bool {
        self.state.lock().enrichment_running
    }

    /// Number of times the enrichment feed was started.
    pub fn enrichment_starts(&self) -> usize {
        self.state.lock().enrichment_starts
    }
}

impl PushSource for SimulatedPlatform {
    fn subscribe(&self, request: &SubscriptionRequest, listener: Arc<dyn LocationListener>) {
        let mut state = self.state.lock();
        state
            .retired_listeners
            .retain(|l| !same_listener(l, &listener));
        state.history.push(request.clone());
        state.subscriptions.push(Subscription {
            request: request.clone(),
            listener,
        });
        state.max_concurrent = state.max_concurrent.max(state.subscriptions.len());
    }

    fn unsubscribe(&self, listener: &Arc<dyn LocationListener>) {
        let mut state = self.state.lock();
        state.unsubscribe_calls += 1;
        let was_subscribed = state
            .subscriptions
            .iter()
            .any(|s| same_listener(&s.listener, listener));
        state
            .subscriptions
            .retain(|s| !same_listener(&s.listener, listener));

        if was_subscribed
            && !state
                .retired_listeners
                .iter()
                .any(|l| same_listener(l, listener))
        {
            state.retired_listeners.push_back(listener.clone());
            while state.retired_listeners.len() > RETAINED_LISTENERS {
                state.retired_listeners.pop_front();
            }
        }
    }

    fn last_known_reading(&self, provider: &ProviderId) -> Option<Reading> {
        self.state
            .lock()
            .provider(provider)
            .and_then(|p| p.last_known.clone())
    }
}

impl ProviderCatalog for SimulatedPlatform {
    fn available_providers(&self, include_disabled: bool) -> Vec<ProviderId> {
        self.state
            .lock()
            .providers
            .iter()
            .filter(|p| include_disabled || p.enabled)
            .map(|p| p.id.clone())
            .collect()
    }

    fn is_provider_enabled(&self, provider: &ProviderId) -> bool {
        self.state
            .lock()
            .provider(provider)
            .is_some_and(|p| p.enabled)
    }

    fn capabilities(&self, provider: &ProviderId) -> Option<ProviderCapabilities> {
        self.state
            .lock()
            .provider(provider)
            .and_then(|p| p.capabilities)
    }
}

impl ServiceAvailability for SimulatedPlatform {
    fn is_enabled(&self) -> bool {
        self.state.lock().service_enabled
    }
}

impl EnrichmentSource for SimulatedPlatform {
    fn start(&self) {
        let mut state = self.state.lock();
        state.enrichment_running = true;
        state.enrichment_starts += 1;
    }

    fn stop(&self) {
        let mut state = self.state.lock();
        state.enrichment_running = false;
        state.latest_metadata = None;
    }

    fn latest_metadata(&self) -> Option<SatelliteMetadata> {
        self.state.lock().latest_metadata.clone()
    }
}
