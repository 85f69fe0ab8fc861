//! Failover Coordinator - owns the active provider cursor.
//!
//! The coordinator subscribes to exactly one provider at a time, walks down the
//! ranked [`ProviderList`] when the active provider is disabled, and jumps back
//! up when a higher-priority provider is re-enabled. Readings from the active
//! provider are filtered by the tier threshold and the quality comparator before
//! they reach the caller.
//!
//! # State Machine
//!
//! ```text
//!   start ──► AwaitingFirstFix(c) ──reading──► Active(c, best)
//!                  │    ▲                        │    ▲
//!          disabled│    │enabled(i < c)  disabled│    │enabled(i < c)
//!                  ▼    │                        ▼    │
//!            (cursor moves, one subscription at a time)
//!                  │
//!      list exhausted / next provider off ──► Exhausted (terminal)
//!
//!   stop (any state) ──► Idle
//! ```
//!
//! # Concurrency
//!
//! All transitions run under one re-entrant lock, so callbacks from different
//! push-source threads form a single sequential stream. Push-source calls and
//! caller callbacks happen while the lock is held but outside the state borrow:
//! a callback may call back into the coordinator (for example `stop`) from the
//! same thread, and no callback can fire once `stop` has returned.
//!
//! Every session gets a fresh generation number. Listener callbacks carry the
//! generation they were registered with and are discarded once it is stale.

use std::cell::RefCell;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use tracing::{debug, info, trace, warn};

use super::comparator::is_better;
use super::error::LocationError;
use super::options::SessionOptions;
use super::platform::{LocationListener, ProviderCatalog, PushSource, SubscriptionRequest};
use super::ranker::ProviderList;
use super::reading::{ProviderId, Reading};

/// Caller callback for accepted readings.
pub type PositionCallback = Arc<dyn Fn(Reading) + Send + Sync>;

/// Caller callback for terminal errors.
pub type ErrorCallback = Arc<dyn Fn(LocationError) + Send + Sync>;

/// Caller-facing sinks for one session.
#[derive(Clone)]
pub struct SessionCallbacks {
    pub on_position: PositionCallback,
    pub on_error: ErrorCallback,
}

impl SessionCallbacks {
    pub fn new<P, E>(on_position: P, on_error: E) -> Self
    where
        P: Fn(Reading) + Send + Sync + 'static,
        E: Fn(LocationError) + Send + Sync + 'static,
    {
        Self {
            on_position: Arc::new(on_position),
            on_error: Arc::new(on_error),
        }
    }
}

impl fmt::Debug for SessionCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCallbacks").finish_non_exhaustive()
    }
}

/// Coordinator state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CoordinatorState {
    #[default]
    Idle,
    AwaitingFirstFix {
        cursor: usize,
    },
    Active {
        cursor: usize,
        best: Reading,
    },
    Exhausted,
}

impl CoordinatorState {
    /// Cursor into the provider list while a provider is subscribed.
    pub fn cursor(&self) -> Option<usize> {
        match self {
            Self::AwaitingFirstFix { cursor } | Self::Active { cursor, .. } => Some(*cursor),
            Self::Idle | Self::Exhausted => None,
        }
    }

    /// Most recently accepted reading.
    pub fn best(&self) -> Option<&Reading> {
        match self {
            Self::Active { best, .. } => Some(best),
            _ => None,
        }
    }

    pub fn phase(&self) -> CoordinatorPhase {
        match self {
            Self::Idle => CoordinatorPhase::Idle,
            Self::AwaitingFirstFix { .. } => CoordinatorPhase::AwaitingFirstFix,
            Self::Active { .. } => CoordinatorPhase::Active,
            Self::Exhausted => CoordinatorPhase::Exhausted,
        }
    }

    /// Same fix state, pointing at another provider.
    fn with_cursor(self, cursor: usize) -> Self {
        match self {
            Self::Active { best, .. } => Self::Active { cursor, best },
            _ => Self::AwaitingFirstFix { cursor },
        }
    }
}

/// Data-free view of [`CoordinatorState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorPhase {
    Idle,
    AwaitingFirstFix,
    Active,
    Exhausted,
}

impl fmt::Display for CoordinatorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::AwaitingFirstFix => write!(f, "AwaitingFirstFix"),
            Self::Active => write!(f, "Active"),
            Self::Exhausted => write!(f, "Exhausted"),
        }
    }
}

/// Point-in-time copy of the coordinator for status queries and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatorSnapshot {
    pub phase: CoordinatorPhase,
    pub cursor: Option<usize>,
    pub best: Option<Reading>,
    pub providers: ProviderList,
    pub subscribed: Option<ProviderId>,
}

/// Notification forwarded by a session listener.
#[derive(Debug)]
enum ListenerEvent {
    Reading(Reading),
    ProviderEnabled(ProviderId),
    ProviderDisabled(ProviderId),
}

/// Side effect of a transition, executed outside the state borrow.
enum Effect {
    Subscribe(SubscriptionRequest, Arc<dyn LocationListener>),
    Unsubscribe(Arc<dyn LocationListener>),
    EmitPosition(PositionCallback, Reading),
    EmitError(ErrorCallback, LocationError),
}

/// Effects of one transition, valid only while `generation` is current.
struct Plan {
    generation: u64,
    effects: Vec<Effect>,
}

/// Per-session data, created at start and dropped at stop.
struct Session {
    providers: ProviderList,
    options: SessionOptions,
    callbacks: SessionCallbacks,
    listener: Arc<dyn LocationListener>,
    subscribed: bool,
}

#[derive(Default)]
struct CoordinatorInner {
    state: CoordinatorState,
    session: Option<Session>,
    generation: u64,
}

impl CoordinatorInner {
    fn plan(&self, effects: Vec<Effect>) -> Plan {
        Plan {
            generation: self.generation,
            effects,
        }
    }

    /// Drop the current session, returning the unsubscribe it needs.
    fn teardown(&mut self) -> Vec<Effect> {
        self.generation += 1;
        self.state = CoordinatorState::Idle;
        match self.session.take() {
            Some(session) if session.subscribed => vec![Effect::Unsubscribe(session.listener)],
            _ => Vec::new(),
        }
    }

    fn apply(&mut self, event: ListenerEvent, catalog: &dyn ProviderCatalog) -> Vec<Effect> {
        match event {
            ListenerEvent::Reading(reading) => self.on_reading(reading),
            ListenerEvent::ProviderEnabled(provider) => self.on_provider_enabled(&provider),
            ListenerEvent::ProviderDisabled(provider) => {
                self.on_provider_disabled(&provider, catalog)
            }
        }
    }

    fn on_reading(&mut self, reading: Reading) -> Vec<Effect> {
        let (Some(cursor), Some(session)) = (self.state.cursor(), self.session.as_ref()) else {
            return Vec::new();
        };

        if reading.provider != session.providers[cursor] {
            trace!(
                provider = %reading.provider,
                active = %session.providers[cursor],
                "Ignoring reading from inactive provider"
            );
            return Vec::new();
        }

        // NaN accuracy fails this comparison and is rejected.
        let threshold = session.options.accuracy.threshold();
        let within_threshold = reading.accuracy <= threshold;
        if !within_threshold {
            debug!(
                provider = %reading.provider,
                accuracy = reading.accuracy,
                threshold,
                "Reading rejected (accuracy above tier threshold)"
            );
            return Vec::new();
        }

        if !is_better(&reading, self.state.best()) {
            debug!(
                provider = %reading.provider,
                accuracy = reading.accuracy,
                "Reading rejected (current fix is better)"
            );
            return Vec::new();
        }

        debug!(
            provider = %reading.provider,
            accuracy = reading.accuracy,
            lat = reading.latitude,
            lon = reading.longitude,
            "Position updated"
        );
        let on_position = session.callbacks.on_position.clone();
        self.state = CoordinatorState::Active {
            cursor,
            best: reading.clone(),
        };
        vec![Effect::EmitPosition(on_position, reading)]
    }

    fn on_provider_disabled(
        &mut self,
        provider: &ProviderId,
        catalog: &dyn ProviderCatalog,
    ) -> Vec<Effect> {
        let (Some(cursor), Some(session)) = (self.state.cursor(), self.session.as_mut()) else {
            return Vec::new();
        };

        if session.providers[cursor] != *provider {
            trace!(provider = %provider, "Ignoring disable of inactive provider");
            return Vec::new();
        }

        let mut effects = vec![Effect::Unsubscribe(session.listener.clone())];
        session.subscribed = false;

        let next = cursor + 1;
        let next_provider = session
            .providers
            .get(next)
            .filter(|p| catalog.is_provider_enabled(p))
            .cloned();

        match next_provider {
            Some(next_provider) => {
                info!(
                    from = %provider,
                    to = %next_provider,
                    cursor = next,
                    "Provider disabled, failing over"
                );
                effects.push(Effect::Subscribe(
                    session.options.subscription_for(next_provider),
                    session.listener.clone(),
                ));
                session.subscribed = true;
                self.state = std::mem::take(&mut self.state).with_cursor(next);
            }
            None => {
                warn!(
                    provider = %provider,
                    remaining = session.providers.len().saturating_sub(next),
                    "Provider disabled and no usable fallback, session exhausted"
                );
                effects.push(Effect::EmitError(
                    session.callbacks.on_error.clone(),
                    LocationError::ProvidersExhausted,
                ));
                self.state = CoordinatorState::Exhausted;
            }
        }

        effects
    }

    fn on_provider_enabled(&mut self, provider: &ProviderId) -> Vec<Effect> {
        let (Some(cursor), Some(session)) = (self.state.cursor(), self.session.as_mut()) else {
            return Vec::new();
        };

        let Some(index) = session.providers.position(provider) else {
            return Vec::new();
        };

        if index >= cursor {
            trace!(provider = %provider, index, cursor, "Enabled provider does not outrank active one");
            return Vec::new();
        }

        info!(
            from = %session.providers[cursor],
            to = %provider,
            cursor = index,
            "Higher-priority provider enabled, switching back"
        );
        let effects = vec![
            Effect::Unsubscribe(session.listener.clone()),
            Effect::Subscribe(
                session.options.subscription_for(provider.clone()),
                session.listener.clone(),
            ),
        ];
        session.subscribed = true;
        self.state = std::mem::take(&mut self.state).with_cursor(index);
        effects
    }

    fn snapshot(&self) -> CoordinatorSnapshot {
        let session = self.session.as_ref();
        CoordinatorSnapshot {
            phase: self.state.phase(),
            cursor: self.state.cursor(),
            best: self.state.best().cloned(),
            providers: session.map(|s| s.providers.clone()).unwrap_or_default(),
            subscribed: session
                .filter(|s| s.subscribed)
                .zip(self.state.cursor())
                .and_then(|(s, cursor)| s.providers.get(cursor).cloned()),
        }
    }
}

/// Failover coordinator.
///
/// Created behind an `Arc`; session listeners hold a weak reference back to it.
pub struct FailoverCoordinator {
    inner: ReentrantMutex<RefCell<CoordinatorInner>>,
    push_source: Arc<dyn PushSource>,
    catalog: Arc<dyn ProviderCatalog>,
    self_ref: Weak<FailoverCoordinator>,
}

impl FailoverCoordinator {
    /// Create an idle coordinator.
    pub fn new(push_source: Arc<dyn PushSource>, catalog: Arc<dyn ProviderCatalog>) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            inner: ReentrantMutex::new(RefCell::new(CoordinatorInner::default())),
            push_source,
            catalog,
            self_ref: self_ref.clone(),
        })
    }

    /// Begin a session over a ranked provider list.
    ///
    /// Any running session is stopped first. An empty list leaves the
    /// coordinator `Exhausted` and reports [`LocationError::ServiceDisabled`]
    /// through the error callback as well as the return value.
    pub fn start(
        &self,
        providers: ProviderList,
        options: SessionOptions,
        callbacks: SessionCallbacks,
    ) -> Result<(), LocationError> {
        let guard = self.inner.lock();

        let plan = {
            let mut inner = guard.borrow_mut();
            let mut effects = inner.teardown();

            if providers.is_empty() {
                warn!("No location providers available, cannot start session");
                inner.state = CoordinatorState::Exhausted;
                effects.push(Effect::EmitError(
                    callbacks.on_error.clone(),
                    LocationError::ServiceDisabled,
                ));
                inner.plan(effects)
            } else {
                let listener: Arc<dyn LocationListener> = Arc::new(SessionListener {
                    coordinator: self.self_ref.clone(),
                    generation: inner.generation,
                });
                let first = providers[0].clone();

                info!(
                    providers = ?providers.as_slice(),
                    accuracy = %options.accuracy,
                    generation = inner.generation,
                    "Starting location session"
                );

                effects.push(Effect::Subscribe(
                    options.subscription_for(first),
                    listener.clone(),
                ));
                inner.session = Some(Session {
                    providers: providers.clone(),
                    options,
                    callbacks,
                    listener,
                    subscribed: true,
                });
                inner.state = CoordinatorState::AwaitingFirstFix { cursor: 0 };
                inner.plan(effects)
            }
        };

        self.execute(&guard, plan);

        if providers.is_empty() {
            Err(LocationError::ServiceDisabled)
        } else {
            Ok(())
        }
    }

    /// Stop the session and return to `Idle`. Idempotent.
    ///
    /// Once this returns no callback of the stopped session will fire.
    pub fn stop(&self) {
        let guard = self.inner.lock();
        let plan = {
            let mut inner = guard.borrow_mut();
            let was_running = inner.session.is_some();
            let effects = inner.teardown();
            if was_running {
                info!(generation = inner.generation, "Location session stopped");
            }
            inner.plan(effects)
        };
        self.execute(&guard, plan);
    }

    /// Run `f` while holding the coordinator lock.
    ///
    /// The lock is re-entrant, so `f` may call `start` and `stop`. Listener
    /// callbacks from other threads wait until `f` returns.
    pub(crate) fn exclusive<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.inner.lock();
        f()
    }

    /// Current state.
    pub fn state(&self) -> CoordinatorState {
        self.inner.lock().borrow().state.clone()
    }

    /// Current state plus session details.
    pub fn snapshot(&self) -> CoordinatorSnapshot {
        self.inner.lock().borrow().snapshot()
    }

    fn dispatch(&self, generation: u64, event: ListenerEvent) {
        let guard = self.inner.lock();
        let plan = {
            let mut inner = guard.borrow_mut();
            if inner.generation != generation {
                trace!(
                    generation,
                    current = inner.generation,
                    ?event,
                    "Discarding callback from a finished session"
                );
                return;
            }
            let effects = inner.apply(event, self.catalog.as_ref());
            inner.plan(effects)
        };
        self.execute(&guard, plan);
    }

    /// Run effects in order, abandoning the rest if a callback changed the session.
    fn execute(&self, guard: &ReentrantMutexGuard<'_, RefCell<CoordinatorInner>>, plan: Plan) {
        for effect in plan.effects {
            if guard.borrow().generation != plan.generation {
                debug!("Session changed while applying effects, skipping the rest");
                return;
            }

            match effect {
                Effect::Subscribe(request, listener) => {
                    self.push_source.subscribe(&request, listener);
                }
                Effect::Unsubscribe(listener) => self.push_source.unsubscribe(&listener),
                Effect::EmitPosition(on_position, reading) => on_position(reading),
                Effect::EmitError(on_error, error) => on_error(error),
            }
        }
    }
}

/// Listener registered with the push source for one session generation.
struct SessionListener {
    coordinator: Weak<FailoverCoordinator>,
    generation: u64,
}

impl SessionListener {
    fn forward(&self, event: ListenerEvent) {
        if let Some(coordinator) = self.coordinator.upgrade() {
            coordinator.dispatch(self.generation, event);
        }
    }
}

impl LocationListener for SessionListener {
    fn on_reading(&self, reading: Reading) {
        self.forward(ListenerEvent::Reading(reading));
    }

    fn on_provider_enabled(&self, provider: &ProviderId) {
        self.forward(ListenerEvent::ProviderEnabled(provider.clone()));
    }

    fn on_provider_disabled(&self, provider: &ProviderId) {
        self.forward(ListenerEvent::ProviderDisabled(provider.clone()));
    }
}
