//! Wrapping combinators for any [`Operation`].

use std::sync::Arc;
use std::time::Duration;

use super::{BoxOperation, Operation};
use crate::admission::debounce::{DebounceFirst, DebounceFirstContext, DebounceLast};
use crate::admission::rate_limit::Throttle;
use crate::resilience::circuit_breaker::Breaker;
use crate::resilience::retries::Retry;

/// Method-style constructors, so pipelines read inside-out:
/// `call.throttle(10, 1, interval).breaker(3).retry(2, delay)`.
pub trait OperationExt: Operation + Sized {
    fn breaker(self, threshold: u32) -> Breaker<Self> {
        Breaker::new(self, threshold)
    }

    fn throttle(self, max_tokens: u32, refill: u32, interval: Duration) -> Throttle<Self> {
        Throttle::new(self, max_tokens, refill, interval)
    }

    fn debounce_first(self, window: Duration) -> DebounceFirst<Self>
    where
        Self::Output: Clone,
        Self::Error: Clone,
    {
        DebounceFirst::new(self, window)
    }

    fn debounce_first_context(self, window: Duration) -> DebounceFirstContext<Self> {
        DebounceFirstContext::new(self, window)
    }

    fn debounce_last(self, window: Duration) -> DebounceLast<Self> {
        DebounceLast::new(self, window)
    }

    fn retry(self, max_retries: u32, delay: Duration) -> Retry<Self> {
        Retry::new(self, max_retries, delay)
    }

    fn boxed(self) -> BoxOperation<Self::Output, Self::Error> {
        Arc::new(self)
    }
}

impl<O: Operation> OperationExt for O {}
