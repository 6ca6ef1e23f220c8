//! Debouncing: collapse bursts of calls into one execution.
//!
//! # Policies
//! - `DebounceFirst`: leading edge; calls inside the window get the cached outcome
//! - `DebounceFirstContext`: leading edge; a new call preempts the previous one
//! - `DebounceLast`: trailing edge; only the last call of a burst executes
//!
//! # Design Decisions
//! - Window state is guarded by a per-instance lock; concurrent callers race for it
//! - Preemption cancels the previous call's derived context, never the caller's own
//! - `DebounceLast` keeps at most one live scheduled task per instance

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};
use tokio::sync::{oneshot, Mutex as AsyncMutex};
use tokio::time::Instant;

use crate::config::{DebounceConfig, DebounceMode};
use crate::operation::{BoxOperation, Context, ContextError, Operation, Outcome};

// ---------------------------------------------------------------------------
// Leading edge, cached
// ---------------------------------------------------------------------------

struct FirstState<T, E> {
    /// Calls before this instant are served from `cached`.
    threshold: Option<Instant>,
    cached: Option<Outcome<T, E>>,
}

/// Runs the first call of a burst and replays its outcome until `window`
/// has elapsed since that call returned.
pub struct DebounceFirst<O: Operation> {
    inner: Arc<O>,
    window: Duration,
    state: Arc<AsyncMutex<FirstState<O::Output, O::Error>>>,
}

impl<O> DebounceFirst<O>
where
    O: Operation,
    O::Output: Clone,
    O::Error: Clone,
{
    pub fn new(inner: O, window: Duration) -> Self {
        Self {
            inner: Arc::new(inner),
            window,
            state: Arc::new(AsyncMutex::new(FirstState {
                threshold: None,
                cached: None,
            })),
        }
    }
}

impl<O: Operation> Clone for DebounceFirst<O> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            window: self.window,
            state: Arc::clone(&self.state),
        }
    }
}

impl<O> Operation for DebounceFirst<O>
where
    O: Operation,
    O::Output: Clone,
    O::Error: Clone,
{
    type Output = O::Output;
    type Error = O::Error;

    fn call(&self, ctx: Context) -> BoxFuture<'static, Outcome<O::Output, O::Error>> {
        let inner = Arc::clone(&self.inner);
        let shared = Arc::clone(&self.state);
        let window = self.window;

        async move {
            // Held across the call: callers arriving mid-flight wait for the
            // outcome instead of starting a second execution.
            let mut state = tokio::select! {
                biased;
                guard = shared.lock() => guard,
                err = ctx.done() => {
                    tracing::debug!(error = %err, "Context done while waiting for in-flight call");
                    return Err(err.into());
                }
            };

            if let (Some(threshold), Some(cached)) = (state.threshold, &state.cached) {
                if Instant::now() < threshold {
                    tracing::trace!("Debounced call served from cache");
                    return cached.clone();
                }
            }

            let outcome = inner.call(ctx).await;
            state.cached = Some(outcome.clone());
            state.threshold = Some(Instant::now() + window);
            outcome
        }
        .boxed()
    }
}

// ---------------------------------------------------------------------------
// Leading edge, preemptive
// ---------------------------------------------------------------------------

#[derive(Default)]
struct PreemptState {
    threshold: Option<Instant>,
    /// Cancel handle of the most recent call.
    previous: Option<Context>,
}

/// Passes every call through, cancelling the previous one if it started
/// less than `window` ago.
pub struct DebounceFirstContext<O> {
    inner: Arc<O>,
    window: Duration,
    state: Arc<Mutex<PreemptState>>,
}

impl<O: Operation> DebounceFirstContext<O> {
    pub fn new(inner: O, window: Duration) -> Self {
        Self {
            inner: Arc::new(inner),
            window,
            state: Arc::new(Mutex::new(PreemptState::default())),
        }
    }
}

impl<O> Clone for DebounceFirstContext<O> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            window: self.window,
            state: Arc::clone(&self.state),
        }
    }
}

impl<O: Operation> Operation for DebounceFirstContext<O> {
    type Output = O::Output;
    type Error = O::Error;

    fn call(&self, ctx: Context) -> BoxFuture<'static, Outcome<O::Output, O::Error>> {
        let inner = Arc::clone(&self.inner);
        let shared = Arc::clone(&self.state);
        let window = self.window;

        async move {
            let call_ctx = {
                let mut state = shared.lock().expect("debounce state lock poisoned");
                let now = Instant::now();

                if let Some(previous) = state.previous.take() {
                    if state.threshold.is_some_and(|threshold| now < threshold) {
                        tracing::debug!("Preempting previous call inside debounce window");
                        previous.cancel();
                    }
                }

                let call_ctx = ctx.child();
                state.previous = Some(call_ctx.clone());
                state.threshold = Some(now + window);
                call_ctx
            };

            inner.call(call_ctx).await
        }
        .boxed()
    }
}

// ---------------------------------------------------------------------------
// Trailing edge
// ---------------------------------------------------------------------------

/// Delays each call by `window`; a newer call cancels the pending one.
pub struct DebounceLast<O> {
    inner: Arc<O>,
    window: Duration,
    /// Cancel handle of the pending (or running) call.
    pending: Arc<Mutex<Option<Context>>>,
}

impl<O: Operation> DebounceLast<O> {
    pub fn new(inner: O, window: Duration) -> Self {
        Self {
            inner: Arc::new(inner),
            window,
            pending: Arc::new(Mutex::new(None)),
        }
    }
}

impl<O> Clone for DebounceLast<O> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            window: self.window,
            pending: Arc::clone(&self.pending),
        }
    }
}

impl<O: Operation> Operation for DebounceLast<O> {
    type Output = O::Output;
    type Error = O::Error;

    fn call(&self, ctx: Context) -> BoxFuture<'static, Outcome<O::Output, O::Error>> {
        let inner = Arc::clone(&self.inner);
        let pending = Arc::clone(&self.pending);
        let window = self.window;

        async move {
            let call_ctx = ctx.child();
            {
                let mut pending = pending.lock().expect("debounce state lock poisoned");
                if let Some(previous) = pending.replace(call_ctx.clone()) {
                    previous.cancel();
                }
            }

            // Dropping this future before an outcome arrives cancels the
            // scheduled call.
            let abandon = call_ctx.token().clone().drop_guard();

            let (tx, rx) = oneshot::channel();
            let scheduled = call_ctx.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = scheduled.done() => return,
                    _ = tokio::time::sleep(window) => {}
                }
                tracing::trace!("Debounce window elapsed, running last call");
                let _ = tx.send(inner.call(scheduled).await);
            });

            let outcome = tokio::select! {
                biased;
                received = rx => match received {
                    Ok(outcome) => outcome,
                    // Scheduled task gave up because the call was superseded.
                    Err(_) => Err(call_ctx.err().unwrap_or(ContextError::Cancelled).into()),
                },
                err = call_ctx.done() => Err(err.into()),
            };
            abandon.disarm();
            outcome
        }
        .boxed()
    }
}

/// Wrap `inner` in the debounce policy selected by `config.mode`.
pub fn from_config<O>(inner: O, config: &DebounceConfig) -> BoxOperation<O::Output, O::Error>
where
    O: Operation,
    O::Output: Clone,
    O::Error: Clone,
{
    let window = config.window();
    match config.mode {
        DebounceMode::First => Arc::new(DebounceFirst::new(inner, window)),
        DebounceMode::FirstContext => Arc::new(DebounceFirstContext::new(inner, window)),
        DebounceMode::Last => Arc::new(DebounceLast::new(inner, window)),
    }
}
