//! Timeout enforcement for calls that cannot be cancelled.
//!
//! # Responsibilities
//! - Run a blocking call on the blocking pool
//! - Race its result against the caller's context
//! - Optionally refuse to start when the context is already done
//!
//! # Design Decisions
//! - The blocking call has no cancellation hook, so a lost race abandons it:
//!   the task runs to completion and its result is discarded
//! - Timeout errors are the context's own errors, distinct from upstream errors

use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};

use crate::config::TimeoutConfig;
use crate::operation::{CallError, Context, ContextError, Operation, Outcome};

/// Makes a blocking, non-cancellable call deadline-aware.
///
/// The call is started on `tokio::task::spawn_blocking`. If the context ends
/// first the wrapper returns the context's error immediately; the call keeps
/// running in the background.
pub struct Timeout<F> {
    slow: Arc<F>,
    precheck: bool,
}

impl<F, T, E> Timeout<F>
where
    F: Fn() -> Result<T, E> + Send + Sync + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    /// Always start the call, then wait for it or the context.
    pub fn new(slow: F) -> Self {
        Self {
            slow: Arc::new(slow),
            precheck: false,
        }
    }

    /// Like [`new`](Self::new), but reject without starting the call when the
    /// context is already done.
    pub fn with_precheck(slow: F) -> Self {
        Self {
            slow: Arc::new(slow),
            precheck: true,
        }
    }

    pub fn from_config(slow: F, config: &TimeoutConfig) -> Self {
        if config.precheck {
            Self::with_precheck(slow)
        } else {
            Self::new(slow)
        }
    }
}

impl<F> Clone for Timeout<F> {
    fn clone(&self) -> Self {
        Self {
            slow: Arc::clone(&self.slow),
            precheck: self.precheck,
        }
    }
}

impl<F, T, E> Operation for Timeout<F>
where
    F: Fn() -> Result<T, E> + Send + Sync + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    type Output = T;
    type Error = E;

    fn call(&self, ctx: Context) -> BoxFuture<'static, Outcome<T, E>> {
        let slow = Arc::clone(&self.slow);
        let precheck = self.precheck;

        async move {
            if precheck {
                if let Some(err) = ctx.err() {
                    tracing::debug!(error = %err, "Context already done, not starting call");
                    return Err(err.into());
                }
            }

            let mut task = tokio::task::spawn_blocking(move || slow());

            tokio::select! {
                biased;
                joined = &mut task => match joined {
                    Ok(result) => result.map_err(CallError::Upstream),
                    Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                    // Only happens when the runtime is shutting down.
                    Err(_) => Err(ContextError::Cancelled.into()),
                },
                err = ctx.done() => {
                    tracing::debug!(error = %err, "Call abandoned, result will be discarded");
                    // Dropping the handle detaches the task; it still runs to completion.
                    drop(task);
                    Err(err.into())
                }
            }
        }
        .boxed()
    }
}
