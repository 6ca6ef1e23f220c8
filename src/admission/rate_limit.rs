//! Token bucket throttle.
//!
//! Calls consume one token each; a background loop adds `refill` tokens every
//! `interval`, capped at `max_tokens`. An empty bucket rejects with
//! `RateLimited`.

use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::ThrottleConfig;
use crate::operation::{CallError, Context, Operation, Outcome};

/// Shared token count. Always within `0..=max_tokens`.
#[derive(Debug)]
struct Tokens {
    available: Mutex<u32>,
    max_tokens: u32,
}

impl Tokens {
    /// Take one token, returning how many remain.
    fn try_acquire(&self) -> Option<u32> {
        let mut available = self.available.lock().expect("throttle token lock poisoned");
        if *available == 0 {
            return None;
        }
        *available -= 1;
        Some(*available)
    }

    fn refill(&self, amount: u32) -> u32 {
        let mut available = self.available.lock().expect("throttle token lock poisoned");
        *available = available.saturating_add(amount).min(self.max_tokens);
        *available
    }

    fn available(&self) -> u32 {
        *self.available.lock().expect("throttle token lock poisoned")
    }
}

/// Instance-owned bucket state. The refill loop only holds `tokens` and a
/// clone of `shutdown`, so dropping the last throttle clone stops the loop.
#[derive(Debug)]
struct Bucket {
    tokens: Arc<Tokens>,
    refill: u32,
    interval: Duration,
    refill_started: Once,
    shutdown: CancellationToken,
}

impl Bucket {
    fn ensure_refill_loop(&self) {
        self.refill_started.call_once(|| {
            tokio::spawn(run_refill_loop(
                Arc::clone(&self.tokens),
                self.refill,
                self.interval,
                self.shutdown.clone(),
            ));
        });
    }
}

impl Drop for Bucket {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn run_refill_loop(
    tokens: Arc<Tokens>,
    refill: u32,
    period: Duration,
    shutdown: CancellationToken,
) {
    // interval_at panics on a zero period
    let period = period.max(Duration::from_millis(1));
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::debug!(
        refill,
        interval_ms = period.as_millis() as u64,
        max_tokens = tokens.max_tokens,
        "Throttle refill loop started"
    );

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::debug!("Throttle refill loop stopped");
                break;
            }
            _ = ticker.tick() => {
                let available = tokens.refill(refill);
                tracing::trace!(available, "Throttle bucket refilled");
            }
        }
    }
}

/// Wraps an operation with token bucket admission control.
pub struct Throttle<O> {
    inner: Arc<O>,
    bucket: Arc<Bucket>,
}

impl<O: Operation> Throttle<O> {
    /// Allow bursts of `max_tokens` calls, adding `refill` tokens every `interval`.
    ///
    /// `interval` must be non-zero. The refill loop starts on the first call
    /// and runs until [`stop`](Self::stop) or until the last clone is dropped.
    pub fn new(inner: O, max_tokens: u32, refill: u32, interval: Duration) -> Self {
        Self {
            inner: Arc::new(inner),
            bucket: Arc::new(Bucket {
                tokens: Arc::new(Tokens {
                    available: Mutex::new(max_tokens),
                    max_tokens,
                }),
                refill,
                interval,
                refill_started: Once::new(),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    pub fn from_config(inner: O, config: &ThrottleConfig) -> Self {
        Self::new(
            inner,
            config.max_tokens,
            config.refill,
            config.refill_interval(),
        )
    }
}

impl<O> Throttle<O> {
    /// Tokens currently in the bucket.
    pub fn available(&self) -> u32 {
        self.bucket.tokens.available()
    }

    /// Stop the refill loop. Remaining tokens can still be spent.
    pub fn stop(&self) {
        self.bucket.shutdown.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.bucket.shutdown.is_cancelled()
    }
}

impl<O> Clone for Throttle<O> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            bucket: Arc::clone(&self.bucket),
        }
    }
}

impl<O: Operation> Operation for Throttle<O> {
    type Output = O::Output;
    type Error = O::Error;

    fn call(&self, ctx: Context) -> BoxFuture<'static, Outcome<O::Output, O::Error>> {
        let inner = Arc::clone(&self.inner);
        let bucket = Arc::clone(&self.bucket);

        async move {
            if let Some(err) = ctx.err() {
                return Err(err.into());
            }

            bucket.ensure_refill_loop();

            // The token lock is released before the call runs.
            match bucket.tokens.try_acquire() {
                Some(remaining) => tracing::trace!(remaining, "Throttle admitted call"),
                None => {
                    tracing::debug!("Throttle bucket empty, rejecting call");
                    return Err(CallError::RateLimited);
                }
            }

            inner.call(ctx).await
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{operation_fn, ContextError};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn counting(calls: Arc<AtomicU32>) -> impl Operation<Output = u32, Error = ()> {
        operation_fn(move |_ctx: Context| {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Ok(n) }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_then_reject() {
        let calls = Arc::new(AtomicU32::new(0));
        let throttle = Throttle::new(counting(calls.clone()), 3, 1, Duration::from_millis(100));

        for _ in 0..3 {
            assert!(throttle.call(Context::background()).await.is_ok());
        }
        assert_eq!(
            throttle.call(Context::background()).await,
            Err(CallError::RateLimited)
        );
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(throttle.available(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refill_is_capped() {
        let calls = Arc::new(AtomicU32::new(0));
        let throttle = Throttle::new(counting(calls), 3, 1, Duration::from_millis(100));

        for _ in 0..3 {
            let _ = throttle.call(Context::background()).await;
        }
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(throttle.available(), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(throttle.available(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_context_consumes_nothing() {
        let calls = Arc::new(AtomicU32::new(0));
        let throttle = Throttle::new(counting(calls.clone()), 2, 1, Duration::from_millis(100));

        let ctx = Context::background();
        ctx.cancel();
        assert_eq!(
            throttle.call(ctx).await,
            Err(CallError::Context(ContextError::Cancelled))
        );
        assert_eq!(throttle.available(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refill_survives_first_caller_context() {
        let calls = Arc::new(AtomicU32::new(0));
        let throttle = Throttle::new(counting(calls), 1, 1, Duration::from_millis(100));

        let first = Context::background().with_timeout(Duration::from_millis(10));
        assert!(throttle.call(first).await.is_ok());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(throttle.available(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_refill() {
        let calls = Arc::new(AtomicU32::new(0));
        let throttle = Throttle::new(counting(calls), 1, 1, Duration::from_millis(100));

        assert!(throttle.call(Context::background()).await.is_ok());
        throttle.stop();
        assert!(throttle.is_stopped());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(throttle.available(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_releases_refill_loop() {
        let calls = Arc::new(AtomicU32::new(0));
        let throttle = Throttle::new(counting(calls), 1, 1, Duration::from_millis(100));
        let tokens = Arc::clone(&throttle.bucket.tokens);

        let _ = throttle.call(Context::background()).await;
        assert_eq!(Arc::strong_count(&tokens), 3);

        drop(throttle);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(Arc::strong_count(&tokens), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_never_share_a_token() {
        let calls = Arc::new(AtomicU32::new(0));
        let throttle = Throttle::new(counting(calls.clone()), 10, 1, Duration::from_secs(3600));

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let throttle = throttle.clone();
                tokio::spawn(async move { throttle.call(Context::background()).await })
            })
            .collect();

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 10);
        assert_eq!(calls.load(Ordering::SeqCst), 10);
        assert_eq!(throttle.available(), 0);
    }
}
