//! Error taxonomy shared by every wrapper.
//!
//! # Kinds
//! - Rejection: the wrapper declined to invoke the operation
//!   (breaker open, bucket empty)
//! - Upstream: the wrapped operation ran and failed; carried verbatim
//! - Cancellation: the governing context ended while the wrapper waited

use thiserror::Error;

/// Why a [`Context`](super::Context) is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ContextError {
    /// The context (or one of its ancestors) was cancelled.
    #[error("context canceled")]
    Cancelled,

    /// The context deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Error returned by an [`Operation`](super::Operation).
///
/// `E` is the upstream error type of the innermost operation. Wrappers never
/// rewrite an `Upstream` error; they only add the other variants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError<E> {
    /// Circuit breaker is open.
    #[error("service unavailable")]
    ServiceUnavailable,

    /// Throttle bucket is empty.
    #[error("too many calls")]
    RateLimited,

    /// The governing context ended.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// The wrapped operation failed.
    #[error("{0}")]
    Upstream(E),
}

/// Coarse classification of a [`CallError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Rejected,
    Upstream,
    Cancelled,
}

impl<E> CallError<E> {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CallError::ServiceUnavailable | CallError::RateLimited => ErrorKind::Rejected,
            CallError::Context(_) => ErrorKind::Cancelled,
            CallError::Upstream(_) => ErrorKind::Upstream,
        }
    }

    /// True when a policy declined to invoke the operation.
    pub fn is_rejection(&self) -> bool {
        self.kind() == ErrorKind::Rejected
    }

    /// True when the governing context was cancelled or expired.
    pub fn is_cancellation(&self) -> bool {
        self.kind() == ErrorKind::Cancelled
    }

    /// The upstream error, if the wrapped operation itself failed.
    pub fn upstream(&self) -> Option<&E> {
        match self {
            CallError::Upstream(err) => Some(err),
            _ => None,
        }
    }

    pub fn into_upstream(self) -> Option<E> {
        match self {
            CallError::Upstream(err) => Some(err),
            _ => None,
        }
    }

    /// Convert the upstream error type, keeping every other variant.
    pub fn map_upstream<F>(self, f: impl FnOnce(E) -> F) -> CallError<F> {
        match self {
            CallError::ServiceUnavailable => CallError::ServiceUnavailable,
            CallError::RateLimited => CallError::RateLimited,
            CallError::Context(err) => CallError::Context(err),
            CallError::Upstream(err) => CallError::Upstream(f(err)),
        }
    }
}
