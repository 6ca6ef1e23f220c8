//! Retry logic.
//!
//! # Responsibilities
//! - Re-invoke a failed operation up to `max_retries` more times
//! - Wait a constant `delay` between attempts
//! - Abort as soon as the governing context ends
//!
//! # Design Decisions
//! - Only for idempotent operations; retrying effectful calls is out of contract
//! - No backoff growth; the delay is constant
//! - Intermediate failures are logged, never returned; the caller sees one outcome
//! - The final failure is returned unmodified

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};

use crate::config::RetryConfig;
use crate::operation::{CallError, Context, Operation, Outcome};

/// Wraps an idempotent operation with bounded, constant-delay retries.
pub struct Retry<O> {
    inner: Arc<O>,
    max_retries: u32,
    delay: Duration,
}

impl<O: Operation> Retry<O> {
    /// An always-failing operation is invoked `max_retries + 1` times.
    pub fn new(inner: O, max_retries: u32, delay: Duration) -> Self {
        Self {
            inner: Arc::new(inner),
            max_retries,
            delay,
        }
    }

    pub fn from_config(inner: O, config: &RetryConfig) -> Self {
        Self::new(inner, config.max_retries, config.delay())
    }
}

impl<O> Clone for Retry<O> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            max_retries: self.max_retries,
            delay: self.delay,
        }
    }
}

impl<O: Operation> Operation for Retry<O> {
    type Output = O::Output;
    type Error = O::Error;

    fn call(&self, ctx: Context) -> BoxFuture<'static, Outcome<O::Output, O::Error>> {
        let inner = Arc::clone(&self.inner);
        let max_retries = self.max_retries;
        let delay = self.delay;

        async move {
            let mut attempt: u32 = 0;
            loop {
                if let Some(err) = ctx.err() {
                    return Err(err.into());
                }

                let outcome = tokio::select! {
                    biased;
                    outcome = inner.call(ctx.clone()) => outcome,
                    err = ctx.done() => return Err(CallError::from(err)),
                };

                let err = match outcome {
                    Ok(value) => return Ok(value),
                    Err(err) => err,
                };

                if attempt >= max_retries {
                    if max_retries > 0 {
                        tracing::warn!(attempts = attempt + 1, "Retries exhausted");
                    }
                    return Err(err);
                }
                attempt += 1;

                tracing::warn!(
                    attempt,
                    max_retries,
                    kind = ?err.kind(),
                    delay_ms = delay.as_millis() as u64,
                    "Attempt failed; retrying"
                );

                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    err = ctx.done() => return Err(err.into()),
                }
            }
        }
        .boxed()
    }
}
