//! Session Controller - public entry point for position tracking.
//!
//! Wires the ranker, the failover coordinator and the enrichment feed to the
//! host platform, and answers one-shot queries that bypass the coordinator.
//!
//! # Usage
//!
//! ```
//! use geofix::location::{
//!     AccuracyTier, ProviderId, SessionCallbacks, SessionController, SessionOptions,
//!     SimulatedPlatform,
//! };
//!
//! let platform = SimulatedPlatform::new();
//! platform.add_provider(ProviderId::NETWORK, true, None);
//!
//! let controller = SessionController::new(platform.services());
//! let callbacks = SessionCallbacks::new(
//!     |reading| println!("fix: {:?}", reading.position()),
//!     |error| eprintln!("tracking failed: {}", error),
//! );
//! controller
//!     .start(SessionOptions::new(AccuracyTier::Low), callbacks)
//!     .unwrap();
//! assert!(controller.is_tracking());
//! controller.stop();
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::comparator::best_of;
use super::coordinator::{CoordinatorPhase, CoordinatorSnapshot, FailoverCoordinator, SessionCallbacks};
use super::error::LocationError;
use super::options::SessionOptions;
use super::platform::{EnrichmentSource, LocationManager, PlatformServices};
use super::ranker::rank;
use super::reading::{Reading, SatelliteMetadata};

/// Default maximum distance between a reading and the metadata annotating it.
pub const DEFAULT_ENRICHMENT_WINDOW: Duration = Duration::from_secs(5);

/// Session controller configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    /// Start the auxiliary satellite feed with each session.
    pub enrichment_enabled: bool,

    /// Maximum timestamp distance between a reading and its metadata.
    pub enrichment_window: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            enrichment_enabled: true,
            enrichment_window: DEFAULT_ENRICHMENT_WINDOW,
        }
    }
}

/// Event delivered by [`SessionController::start_broadcast`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Position(Reading),
    Error(LocationError),
}

/// Public entry point for starting and stopping tracking sessions.
pub struct SessionController {
    services: PlatformServices,
    coordinator: Option<Arc<FailoverCoordinator>>,
    config: ControllerConfig,
    enrichment_active: AtomicBool,
}

impl SessionController {
    /// Create a controller with default configuration.
    pub fn new(services: PlatformServices) -> Self {
        Self::with_config(services, ControllerConfig::default())
    }

    /// Create a controller with custom configuration.
    pub fn with_config(services: PlatformServices, config: ControllerConfig) -> Self {
        let coordinator = services
            .location_manager
            .as_ref()
            .map(|manager| {
                FailoverCoordinator::new(manager.push_source.clone(), manager.catalog.clone())
            });

        Self {
            services,
            coordinator,
            config,
            enrichment_active: AtomicBool::new(false),
        }
    }

    /// Whether location services are usable. False without a location manager.
    pub fn is_location_service_enabled(&self) -> bool {
        self.services.location_manager.is_some() && self.services.service.is_enabled()
    }

    /// Best cached reading across all enabled providers.
    pub fn last_known_position(&self) -> Option<Reading> {
        let manager = self.services.location_manager.as_ref()?;
        let readings = manager
            .catalog
            .available_providers(false)
            .iter()
            .filter_map(|provider| manager.push_source.last_known_reading(provider))
            .collect::<Vec<_>>();

        let best = best_of(readings);
        debug!(
            provider = ?best.as_ref().map(|r| r.provider.to_string()),
            "Last known position queried"
        );
        best
    }

    /// Start a tracking session, stopping any session already running.
    ///
    /// Fails with [`LocationError::ServiceDisabled`] when location services are
    /// off or no provider can be ranked. Failures are reported through
    /// `callbacks.on_error` and returned.
    ///
    /// `start` and `stop` are serialized with each other and with listener
    /// callbacks, so the enrichment feed always runs exactly while a session does.
    pub fn start(
        &self,
        options: SessionOptions,
        callbacks: SessionCallbacks,
    ) -> Result<(), LocationError> {
        let (Some(manager), Some(coordinator)) = (
            self.services.location_manager.as_ref(),
            self.coordinator.as_ref(),
        ) else {
            warn!("No location manager available");
            (callbacks.on_error)(LocationError::ServiceDisabled);
            return Err(LocationError::ServiceDisabled);
        };

        coordinator.exclusive(|| {
            self.stop_session(coordinator);
            self.start_session(manager, coordinator, options, callbacks)
        })
    }

    fn start_session(
        &self,
        manager: &LocationManager,
        coordinator: &FailoverCoordinator,
        options: SessionOptions,
        callbacks: SessionCallbacks,
    ) -> Result<(), LocationError> {
        if !self.services.service.is_enabled() {
            warn!("Location services disabled, not starting session");
            (callbacks.on_error)(LocationError::ServiceDisabled);
            return Err(LocationError::ServiceDisabled);
        }

        let providers = rank(options.accuracy, manager.catalog.as_ref());
        if providers.is_empty() {
            warn!(accuracy = %options.accuracy, "No location provider available");
            (callbacks.on_error)(LocationError::ServiceDisabled);
            return Err(LocationError::ServiceDisabled);
        }

        let callbacks = self.with_enrichment(callbacks);
        self.start_enrichment();
        coordinator.start(providers, options, callbacks)
    }

    /// Start a session that publishes to a broadcast channel.
    pub fn start_broadcast(
        &self,
        options: SessionOptions,
        capacity: usize,
    ) -> Result<broadcast::Receiver<SessionEvent>, LocationError> {
        let (tx, rx) = broadcast::channel(capacity.max(1));
        let position_tx = tx.clone();
        let callbacks = SessionCallbacks::new(
            move |reading| {
                let _ = position_tx.send(SessionEvent::Position(reading));
            },
            move |error| {
                let _ = tx.send(SessionEvent::Error(error));
            },
        );

        self.start(options, callbacks)?;
        Ok(rx)
    }

    /// Stop the current session. Idempotent.
    pub fn stop(&self) {
        if let Some(coordinator) = &self.coordinator {
            coordinator.exclusive(|| self.stop_session(coordinator));
        }
    }

    fn stop_session(&self, coordinator: &FailoverCoordinator) {
        coordinator.stop();

        if self.enrichment_active.swap(false, Ordering::SeqCst) {
            if let Some(enrichment) = &self.services.enrichment {
                enrichment.stop();
                debug!("Satellite metadata feed stopped");
            }
        }
    }

    /// Coordinator state, or `None` without a location manager.
    pub fn status(&self) -> Option<CoordinatorSnapshot> {
        self.coordinator.as_ref().map(|c| c.snapshot())
    }

    /// Whether a provider is currently subscribed.
    pub fn is_tracking(&self) -> bool {
        self.status().is_some_and(|s| {
            matches!(
                s.phase,
                CoordinatorPhase::AwaitingFirstFix | CoordinatorPhase::Active
            )
        })
    }

    fn enrichment(&self) -> Option<&Arc<dyn EnrichmentSource>> {
        self.services
            .enrichment
            .as_ref()
            .filter(|_| self.config.enrichment_enabled)
    }

    fn start_enrichment(&self) {
        if let Some(enrichment) = self.enrichment() {
            if !self.enrichment_active.swap(true, Ordering::SeqCst) {
                enrichment.start();
                info!("Satellite metadata feed started");
            }
        }
    }

    /// Wrap the position callback so accepted readings pick up satellite metadata.
    fn with_enrichment(&self, callbacks: SessionCallbacks) -> SessionCallbacks {
        let Some(enrichment) = self.enrichment().cloned() else {
            return callbacks;
        };

        let window = TimeDelta::from_std(self.config.enrichment_window).unwrap_or(TimeDelta::MAX);
        let on_position = callbacks.on_position;
        SessionCallbacks {
            on_position: Arc::new(move |reading| {
                on_position(annotate(reading, enrichment.latest_metadata(), window));
            }),
            on_error: callbacks.on_error,
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Attach metadata captured within `window` of the reading.
fn annotate(reading: Reading, metadata: Option<SatelliteMetadata>, window: TimeDelta) -> Reading {
    match metadata {
        Some(metadata) => {
            let delta = reading.timestamp - metadata.timestamp;
            if delta <= window && delta >= -window {
                reading.with_satellites(metadata)
            } else {
                reading
            }
        }
        None => reading,
    }
}
