//! Integration tests for location provider failover.
//!
//! These tests drive the public [`SessionController`] against the in-memory
//! [`SimulatedPlatform`] and verify the complete flows:
//! - Provider ranking → subscription of the top provider
//! - Provider disabled → failover to the next ranked provider
//! - Higher-priority provider re-enabled → preemption
//! - Exhaustion and service-disabled error reporting
//! - Late callbacks after `stop()`
//!
//! Run with: `cargo test --test failover_integration`

use std::sync::Arc;
use std::thread;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;

use geofix::config::ConfigFile;
use geofix::location::{
    AccuracyClass, AccuracyTier, CoordinatorPhase, LocationError, PowerUsage,
    ProviderCapabilities, ProviderId, ProviderStatus, Reading, SatelliteMetadata,
    SessionCallbacks, SessionController, SessionEvent, SessionOptions, SimulatedPlatform,
};

// ============================================================================
// Test Helpers
// ============================================================================

/// Records everything the controller reports to the caller.
#[derive(Clone, Default)]
struct Recorder {
    positions: Arc<Mutex<Vec<Reading>>>,
    errors: Arc<Mutex<Vec<LocationError>>>,
}

impl Recorder {
    fn callbacks(&self) -> SessionCallbacks {
        let positions = self.positions.clone();
        let errors = self.errors.clone();
        SessionCallbacks::new(
            move |reading| positions.lock().push(reading),
            move |error| errors.lock().push(error),
        )
    }

    fn positions(&self) -> Vec<Reading> {
        self.positions.lock().clone()
    }

    fn errors(&self) -> Vec<LocationError> {
        self.errors.lock().clone()
    }
}

fn t0() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

fn reading(provider: ProviderId, accuracy: f32, offset_secs: i64) -> Reading {
    Reading::new(
        provider,
        53.63,
        9.99,
        accuracy,
        t0() + TimeDelta::seconds(offset_secs),
    )
}

/// GPS (fine, high power) and NETWORK (coarse, low power), both enabled.
fn gps_and_network() -> SimulatedPlatform {
    let platform = SimulatedPlatform::new();
    platform.add_provider(
        ProviderId::GPS,
        true,
        Some(ProviderCapabilities::new(AccuracyClass::Fine, PowerUsage::High)),
    );
    platform.add_provider(
        ProviderId::NETWORK,
        true,
        Some(ProviderCapabilities::new(AccuracyClass::Coarse, PowerUsage::Low)),
    );
    platform
}

// ============================================================================
// Failover
// ============================================================================

#[test]
fn test_gps_disabled_fails_over_to_network() {
    let platform = gps_and_network();
    let controller = SessionController::new(platform.services());
    let recorder = Recorder::default();

    controller
        .start(SessionOptions::new(AccuracyTier::Best), recorder.callbacks())
        .unwrap();
    assert_eq!(platform.active_subscriptions(), vec![ProviderId::GPS]);

    platform.set_provider_enabled(&ProviderId::GPS, false);

    let status = controller.status().unwrap();
    assert_eq!(platform.active_subscriptions(), vec![ProviderId::NETWORK]);
    assert_eq!(status.cursor, Some(1));
    assert_eq!(status.subscribed, Some(ProviderId::NETWORK));
    assert!(recorder.errors().is_empty());
    assert_eq!(platform.max_concurrent_subscriptions(), 1);
}

#[test]
fn test_single_provider_disabled_reports_exhausted_once() {
    let platform = SimulatedPlatform::new();
    platform.add_provider(
        ProviderId::NETWORK,
        true,
        Some(ProviderCapabilities::new(AccuracyClass::Coarse, PowerUsage::Low)),
    );
    let controller = SessionController::new(platform.services());
    let recorder = Recorder::default();

    controller
        .start(SessionOptions::new(AccuracyTier::Low), recorder.callbacks())
        .unwrap();
    platform.set_provider_enabled(&ProviderId::NETWORK, false);
    platform.set_provider_enabled(&ProviderId::NETWORK, false);
    platform.push_reading(reading(ProviderId::NETWORK, 20.0, 1));

    assert_eq!(recorder.errors(), vec![LocationError::ProvidersExhausted]);
    assert!(recorder.positions().is_empty());
    assert_eq!(
        controller.status().unwrap().phase,
        CoordinatorPhase::Exhausted
    );
    assert!(!controller.is_tracking());
}

#[test]
fn test_next_provider_already_disabled_reports_exhausted() {
    let platform = gps_and_network();
    let controller = SessionController::new(platform.services());
    let recorder = Recorder::default();

    controller
        .start(SessionOptions::new(AccuracyTier::Best), recorder.callbacks())
        .unwrap();
    platform.set_provider_enabled(&ProviderId::NETWORK, false);
    platform.set_provider_enabled(&ProviderId::GPS, false);

    assert_eq!(recorder.errors(), vec![LocationError::ProvidersExhausted]);
    assert!(platform.active_subscriptions().is_empty());
}

#[test]
fn test_reenabled_gps_preempts_network() {
    let platform = gps_and_network();
    let controller = SessionController::new(platform.services());
    let recorder = Recorder::default();

    controller
        .start(SessionOptions::new(AccuracyTier::Best), recorder.callbacks())
        .unwrap();
    platform.set_provider_enabled(&ProviderId::GPS, false);
    platform.set_provider_enabled(&ProviderId::GPS, true);

    let status = controller.status().unwrap();
    assert_eq!(platform.active_subscriptions(), vec![ProviderId::GPS]);
    assert_eq!(status.cursor, Some(0));
    assert_eq!(platform.max_concurrent_subscriptions(), 1);
}

#[test]
fn test_legacy_status_changes_drive_failover() {
    let platform = gps_and_network();
    let controller = SessionController::new(platform.services());
    let recorder = Recorder::default();

    controller
        .start(SessionOptions::new(AccuracyTier::Best), recorder.callbacks())
        .unwrap();

    platform.report_status(&ProviderId::GPS, ProviderStatus::TemporarilyUnavailable);
    assert_eq!(platform.active_subscriptions(), vec![ProviderId::GPS]);

    platform.report_status(&ProviderId::GPS, ProviderStatus::OutOfService);
    assert_eq!(platform.active_subscriptions(), vec![ProviderId::NETWORK]);

    platform.report_status(&ProviderId::GPS, ProviderStatus::Available);
    assert_eq!(platform.active_subscriptions(), vec![ProviderId::GPS]);
    assert!(recorder.errors().is_empty());
}

// ============================================================================
// Reading Acceptance
// ============================================================================

#[test]
fn test_less_accurate_network_reading_not_emitted() {
    let platform = gps_and_network();
    let controller = SessionController::new(platform.services());
    let recorder = Recorder::default();

    controller
        .start(
            SessionOptions::new(AccuracyTier::Medium),
            recorder.callbacks(),
        )
        .unwrap();
    platform.push_reading(reading(ProviderId::GPS, 40.0, 0));
    platform.set_provider_enabled(&ProviderId::GPS, false);
    platform.push_reading(reading(ProviderId::NETWORK, 60.0, 5));

    let positions = recorder.positions();
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].provider, ProviderId::GPS);
    assert_eq!(controller.status().unwrap().best.unwrap().accuracy, 40.0);
}

#[test]
fn test_fresh_network_reading_replaces_stale_gps() {
    let platform = gps_and_network();
    let controller = SessionController::new(platform.services());
    let recorder = Recorder::default();

    controller
        .start(
            SessionOptions::new(AccuracyTier::Medium),
            recorder.callbacks(),
        )
        .unwrap();
    platform.push_reading(reading(ProviderId::GPS, 10.0, 0));
    platform.set_provider_enabled(&ProviderId::GPS, false);
    platform.push_reading(reading(ProviderId::NETWORK, 200.0, 61));

    let positions = recorder.positions();
    assert_eq!(positions.len(), 2);
    assert_eq!(positions[1].provider, ProviderId::NETWORK);
}

#[test]
fn test_readings_over_tier_threshold_dropped() {
    let platform = gps_and_network();
    let controller = SessionController::new(platform.services());
    let recorder = Recorder::default();

    controller
        .start(SessionOptions::new(AccuracyTier::Best), recorder.callbacks())
        .unwrap();
    platform.push_reading(reading(ProviderId::GPS, 51.0, 0));
    assert!(recorder.positions().is_empty());
    assert_eq!(
        controller.status().unwrap().phase,
        CoordinatorPhase::AwaitingFirstFix
    );

    platform.push_reading(reading(ProviderId::GPS, 50.0, 1));
    assert_eq!(recorder.positions().len(), 1);
    assert_eq!(controller.status().unwrap().phase, CoordinatorPhase::Active);
}

#[test]
fn test_readings_enriched_with_recent_metadata() {
    let platform = gps_and_network();
    let controller = SessionController::new(platform.services());
    let recorder = Recorder::default();
    let metadata = SatelliteMetadata {
        timestamp: t0(),
        satellites_in_view: 11,
        satellites_used: 7,
        msl_altitude: Some(12.0),
    };

    controller
        .start(SessionOptions::new(AccuracyTier::Best), recorder.callbacks())
        .unwrap();
    platform.push_metadata(metadata.clone());
    platform.push_reading(reading(ProviderId::GPS, 8.0, 2));
    platform.push_reading(reading(ProviderId::GPS, 4.0, 30));

    let positions = recorder.positions();
    assert_eq!(positions.len(), 2);
    assert_eq!(positions[0].satellites, Some(metadata));
    assert!(positions[1].satellites.is_none());
}

// ============================================================================
// Session Lifecycle
// ============================================================================

#[test]
fn test_service_disabled_reports_synchronously() {
    let platform = gps_and_network();
    platform.set_service_enabled(false);
    let controller = SessionController::new(platform.services());
    let recorder = Recorder::default();

    let result = controller.start(SessionOptions::default(), recorder.callbacks());

    assert_eq!(result, Err(LocationError::ServiceDisabled));
    assert_eq!(recorder.errors(), vec![LocationError::ServiceDisabled]);
    assert!(platform.subscription_history().is_empty());
    assert!(!controller.is_location_service_enabled());
}

#[test]
fn test_late_callbacks_after_stop_are_invisible() {
    let platform = gps_and_network();
    let controller = SessionController::new(platform.services());
    let recorder = Recorder::default();

    controller
        .start(SessionOptions::new(AccuracyTier::Best), recorder.callbacks())
        .unwrap();
    controller.stop();

    platform.deliver_to_all_listeners(reading(ProviderId::GPS, 5.0, 0));
    platform.set_provider_enabled(&ProviderId::GPS, false);

    assert!(recorder.positions().is_empty());
    assert!(recorder.errors().is_empty());
    assert_eq!(controller.status().unwrap().phase, CoordinatorPhase::Idle);
    assert!(!platform.enrichment_running());
}

#[test]
fn test_last_known_position_picks_best_cached() {
    let platform = gps_and_network();
    let controller = SessionController::new(platform.services());

    assert!(controller.last_known_position().is_none());

    platform.set_last_known(reading(ProviderId::GPS, 15.0, 0));
    platform.set_last_known(reading(ProviderId::NETWORK, 300.0, 90));

    let best = controller.last_known_position().unwrap();
    assert_eq!(best.provider, ProviderId::NETWORK);
    assert!(platform.subscription_history().is_empty());
}

#[test]
fn test_concurrent_events_keep_single_subscription() {
    let platform = gps_and_network();
    let controller = SessionController::new(platform.services());
    let recorder = Recorder::default();

    controller
        .start(SessionOptions::new(AccuracyTier::Medium), recorder.callbacks())
        .unwrap();

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let platform = platform.clone();
            thread::spawn(move || {
                for i in 0..50 {
                    let provider = if (i + worker) % 2 == 0 {
                        ProviderId::GPS
                    } else {
                        ProviderId::NETWORK
                    };
                    platform.push_reading(reading(provider, 30.0, i));
                    platform.set_provider_enabled(&ProviderId::GPS, i % 3 != 0);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(platform.max_concurrent_subscriptions() <= 1);
    assert!(recorder.errors().len() <= 1);
}

// ============================================================================
// Configuration and Broadcast
// ============================================================================

#[tokio::test]
async fn test_configured_broadcast_session() {
    let config = ConfigFile::from_ini_str(
        "[session]\naccuracy = low\ntime_interval_ms = 250\n\n[enrichment]\nenabled = false\n",
    )
    .unwrap();
    let platform = gps_and_network();
    let controller = SessionController::with_config(platform.services(), config.controller_config());

    let mut rx = controller
        .start_broadcast(config.session.options.clone(), 16)
        .unwrap();
    platform.push_reading(reading(ProviderId::GPS, 120.0, 0));
    controller.stop();

    match rx.recv().await.unwrap() {
        SessionEvent::Position(reading) => assert_eq!(reading.accuracy, 120.0),
        other => panic!("unexpected event {:?}", other),
    }
    let history = platform.subscription_history();
    assert_eq!(history[0].min_interval, std::time::Duration::from_millis(250));
    assert_eq!(platform.enrichment_starts(), 0);
}
