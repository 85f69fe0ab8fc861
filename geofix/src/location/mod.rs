//! Location Provider Failover
//!
//! This module turns a host's set of location providers into a single stream of
//! position fixes. One provider is subscribed at a time; when it goes away the
//! session fails over to the next one in rank order.
//!
//! # Architecture
//!
//! - **Quality Comparator** decides whether a new reading replaces the current best
//! - **Provider Ranker** orders providers for a requested accuracy tier
//! - **Failover Coordinator** walks the ranked list and filters readings
//! - **Session Controller** is the public entry point
//!
//! Selection logic:
//! 1. A reading more than 60s newer than the current best always wins
//! 2. A reading more than 60s older never wins
//! 3. Otherwise accuracy decides, with a tolerance for newer readings from the
//!    same provider
//!
//! # Usage
//!
//! ```
//! use geofix::location::{
//!     AccuracyTier, ProviderId, SessionController, SessionEvent, SessionOptions,
//!     SimulatedPlatform,
//! };
//!
//! let platform = SimulatedPlatform::new();
//! platform.add_provider(ProviderId::GPS, true, None);
//!
//! let controller = SessionController::new(platform.services());
//! let mut events = controller
//!     .start_broadcast(SessionOptions::new(AccuracyTier::Best), 16)
//!     .unwrap();
//!
//! platform.set_provider_enabled(&ProviderId::GPS, false);
//! assert!(matches!(events.try_recv(), Ok(SessionEvent::Error(_))));
//! ```
//!
//! # Components
//!
//! - [`comparator`] - `is_better` and `best_of`
//! - [`ranker`] - `rank` and `ProviderList`
//! - [`coordinator`] - `FailoverCoordinator` state machine
//! - [`session`] - `SessionController`
//! - [`platform`] - traits implemented by the host
//! - [`simulator`] - `SimulatedPlatform` in-memory host

mod accuracy;
pub mod comparator;
pub mod coordinator;
mod error;
mod options;
pub mod platform;
pub mod ranker;
mod reading;
pub mod session;
pub mod simulator;

pub use accuracy::{
    AccuracyClass, AccuracyRequirement, AccuracyTier, PowerRequirement, PowerUsage,
    ProviderCapabilities, ProviderCriteria,
};
pub use comparator::{best_of, is_better};
pub use coordinator::{
    CoordinatorPhase, CoordinatorSnapshot, CoordinatorState, FailoverCoordinator,
    SessionCallbacks,
};
pub use error::LocationError;
pub use options::SessionOptions;
pub use platform::{
    EnrichmentSource, LocationListener, LocationManager, PlatformServices, ProviderCatalog,
    ProviderStatus, PushSource, ServiceAvailability, SubscriptionRequest,
};
pub use ranker::{rank, ProviderList};
pub use reading::{ProviderId, Reading, SatelliteMetadata};
pub use session::{ControllerConfig, SessionController, SessionEvent};
pub use simulator::SimulatedPlatform;
