//! Circuit breaker for upstream protection.
//!
//! # States
//! - Closed: failures below threshold, calls pass through
//! - Open: threshold reached and cooldown running, calls fail fast
//! - Probing: cooldown elapsed, the next call is let through
//!
//! # State Transitions
//! ```text
//! Closed → Open: failures >= threshold
//! Open → Probing: now > last attempt + unit * 2^(failures - threshold + 1)
//! Probing → Closed: probe succeeds (failures reset to 0)
//! Probing → Open: probe fails (failures + 1, cooldown doubles)
//! ```
//!
//! # Design Decisions
//! - State is derived from counters on every call; there is no stored Open flag
//! - Fail fast while open: the operation is not invoked and state is untouched
//! - Concurrent callers racing the cooldown boundary may all be admitted as probes
//! - The state lock is never held across the wrapped call

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};
use tokio::time::Instant;

use crate::config::BreakerConfig;
use crate::operation::{CallError, Context, Operation, Outcome};
use crate::resilience::backoff::cooldown;

/// Circuit state as observed right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    Probing,
}

#[derive(Debug, Default)]
struct BreakerState {
    /// Consecutive failures.
    failures: u32,
    /// When the most recent admitted call returned.
    last: Option<Instant>,
}

#[derive(Debug)]
struct BreakerShared {
    threshold: u32,
    cooldown_unit: Duration,
    state: Mutex<BreakerState>,
}

impl BreakerShared {
    fn admits(&self, state: &BreakerState, now: Instant) -> bool {
        let Some(overflow) = state.failures.checked_sub(self.threshold) else {
            return true;
        };
        let Some(last) = state.last else {
            return true;
        };
        match last.checked_add(cooldown(overflow, self.cooldown_unit)) {
            Some(retry_at) => now > retry_at,
            None => false,
        }
    }

    fn try_admit(&self) -> bool {
        let state = self.state.lock().expect("breaker state lock poisoned");
        self.admits(&state, Instant::now())
    }

    fn record(&self, success: bool) {
        let (failures, previous) = {
            let mut state = self.state.lock().expect("breaker state lock poisoned");
            let previous = state.failures;
            state.last = Some(Instant::now());
            state.failures = if success {
                0
            } else {
                previous.saturating_add(1)
            };
            (state.failures, previous)
        };

        if success {
            if previous >= self.threshold {
                tracing::info!(previous_failures = previous, "Circuit closed after successful probe");
            }
        } else if let Some(overflow) = failures.checked_sub(self.threshold) {
            let cooldown_ms = cooldown(overflow, self.cooldown_unit).as_millis();
            tracing::warn!(
                failures,
                threshold = self.threshold,
                cooldown_ms = %cooldown_ms,
                "Circuit open"
            );
        }
    }
}

/// Wraps an operation with failure-counting circuit breaker logic.
pub struct Breaker<O> {
    inner: Arc<O>,
    shared: Arc<BreakerShared>,
}

impl<O: Operation> Breaker<O> {
    /// Trip after `threshold` consecutive failures, with a one second cooldown unit.
    pub fn new(inner: O, threshold: u32) -> Self {
        Self::with_cooldown_unit(inner, threshold, Duration::from_secs(1))
    }

    pub fn with_cooldown_unit(inner: O, threshold: u32, cooldown_unit: Duration) -> Self {
        Self {
            inner: Arc::new(inner),
            shared: Arc::new(BreakerShared {
                threshold,
                cooldown_unit,
                state: Mutex::new(BreakerState::default()),
            }),
        }
    }

    pub fn from_config(inner: O, config: &BreakerConfig) -> Self {
        Self::with_cooldown_unit(inner, config.threshold, config.cooldown_unit())
    }
}

impl<O> Breaker<O> {
    /// Current consecutive failure count.
    pub fn failures(&self) -> u32 {
        self.shared
            .state
            .lock()
            .expect("breaker state lock poisoned")
            .failures
    }

    pub fn state(&self) -> CircuitState {
        let state = self.shared.state.lock().expect("breaker state lock poisoned");
        if state.failures < self.shared.threshold {
            CircuitState::Closed
        } else if self.shared.admits(&state, Instant::now()) {
            CircuitState::Probing
        } else {
            CircuitState::Open
        }
    }
}

impl<O> Clone for Breaker<O> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<O: Operation> Operation for Breaker<O> {
    type Output = O::Output;
    type Error = O::Error;

    fn call(&self, ctx: Context) -> BoxFuture<'static, Outcome<O::Output, O::Error>> {
        let inner = Arc::clone(&self.inner);
        let shared = Arc::clone(&self.shared);

        async move {
            if !shared.try_admit() {
                tracing::debug!(threshold = shared.threshold, "Circuit open, rejecting call");
                return Err(CallError::ServiceUnavailable);
            }

            let outcome = inner.call(ctx).await;
            shared.record(outcome.is_ok());
            outcome
        }
        .boxed()
    }
}
