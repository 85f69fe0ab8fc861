//! Per-session request options.

use std::time::Duration;

use super::accuracy::AccuracyTier;
use super::platform::SubscriptionRequest;
use super::reading::ProviderId;

/// Options fixed for the lifetime of a tracking session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    /// Desired accuracy/power tradeoff.
    pub accuracy: AccuracyTier,

    /// Minimum time between updates.
    pub time_interval: Duration,

    /// Minimum distance (meters) between updates.
    pub distance_filter: f32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            accuracy: AccuracyTier::Best,
            time_interval: Duration::ZERO,
            distance_filter: 0.0,
        }
    }
}

impl SessionOptions {
    /// Options for a tier with no interval or distance filtering.
    pub fn new(accuracy: AccuracyTier) -> Self {
        Self {
            accuracy,
            ..Self::default()
        }
    }

    pub fn with_time_interval(mut self, time_interval: Duration) -> Self {
        self.time_interval = time_interval;
        self
    }

    pub fn with_distance_filter(mut self, meters: f32) -> Self {
        self.distance_filter = meters;
        self
    }

    /// Build the push-source subscription for one provider.
    pub(crate) fn subscription_for(&self, provider: ProviderId) -> SubscriptionRequest {
        SubscriptionRequest {
            provider,
            min_interval: self.time_interval,
            min_distance: self.distance_filter,
        }
    }
}
