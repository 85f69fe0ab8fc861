//! Error codes reported to the caller.

use thiserror::Error;

/// Terminal session errors.
///
/// Both variants end the session. Stale or mismatched callbacks are never
/// reported as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LocationError {
    /// Location services are off, or no provider could be ranked at start.
    #[error("Location services are disabled")]
    ServiceDisabled,

    /// Every ranked provider became unavailable during the session.
    #[error("All location providers are unavailable")]
    ProvidersExhausted,
}

impl LocationError {
    /// Stable code for hosts that marshal errors across a boundary.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ServiceDisabled => "LOCATION_SERVICES_DISABLED",
            Self::ProvidersExhausted => "PROVIDERS_EXHAUSTED",
        }
    }
}
