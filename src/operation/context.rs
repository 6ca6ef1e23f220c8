//! Cancellation-bearing call context.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::error::ContextError;

/// Cancellation signal plus optional deadline handed to every operation.
///
/// Derived contexts (`child`, `with_timeout`, `with_deadline`) are cancelled
/// together with their parent, but cancelling a derived context leaves the
/// parent untouched. Clones share the same signal.
#[derive(Debug, Clone)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A root context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::from_token(CancellationToken::new())
    }

    /// Wrap an existing token, e.g. a process-wide shutdown token.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Derive a context that can be cancelled independently of this one.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Derive a context that expires at `at`, or earlier if this one does.
    pub fn with_deadline(&self, at: Instant) -> Self {
        let deadline = match self.deadline {
            Some(current) if current <= at => current,
            _ => at,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    /// Derive a context that expires after `timeout`.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(at) => self.with_deadline(at),
            None => self.child(),
        }
    }

    /// Cancel this context and everything derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Why the context is done, or `None` while it is still live.
    ///
    /// Cancellation takes precedence over an elapsed deadline.
    pub fn err(&self) -> Option<ContextError> {
        if self.token.is_cancelled() {
            return Some(ContextError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Resolve once the context is cancelled or its deadline passes.
    pub async fn done(&self) -> ContextError {
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                _ = self.token.cancelled() => ContextError::Cancelled,
                _ = tokio::time::sleep_until(deadline) => ContextError::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                ContextError::Cancelled
            }
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_is_live() {
        let ctx = Context::background();
        assert!(ctx.err().is_none());
        assert!(ctx.deadline().is_none());
    }

    #[test]
    fn test_child_cancellation_is_one_way() {
        let parent = Context::background();
        let child = parent.child();
        child.cancel();
        assert_eq!(child.err(), Some(ContextError::Cancelled));
        assert!(parent.err().is_none());

        let child = parent.child();
        parent.cancel();
        assert_eq!(child.err(), Some(ContextError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expiry() {
        let ctx = Context::background().with_timeout(Duration::from_millis(100));
        assert!(ctx.err().is_none());

        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn test_earlier_deadline_wins() {
        let outer = Context::background().with_timeout(Duration::from_millis(50));
        let inner = outer.with_timeout(Duration::from_secs(10));
        assert_eq!(inner.deadline(), outer.deadline());
    }

    #[tokio::test(start_paused = true)]
    async fn test_done_resolves_on_deadline() {
        let ctx = Context::background().with_timeout(Duration::from_millis(30));
        let start = Instant::now();
        assert_eq!(ctx.done().await, ContextError::DeadlineExceeded);
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn test_done_resolves_on_cancel() {
        let ctx = Context::background();
        let waiter = ctx.clone();
        let handle = tokio::spawn(async move { waiter.done().await });
        ctx.cancel();
        assert_eq!(handle.await.unwrap(), ContextError::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_wins_over_deadline() {
        let ctx = Context::background().with_deadline(Instant::now());
        ctx.cancel();
        assert_eq!(ctx.err(), Some(ContextError::Cancelled));
    }
}
