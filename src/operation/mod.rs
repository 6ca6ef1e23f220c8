//! The operation abstraction every wrapper consumes and produces.
//!
//! # Data Flow
//! ```text
//! caller
//!     → Context (cancellation + deadline)
//!     → outer wrapper (e.g. Retry)
//!     → ... inner wrappers (Breaker, Throttle, Debounce*)
//!     → innermost operation (caller supplied, or Timeout around a blocking call)
//!     ← Outcome<T, E> flows back unchanged unless a wrapper rejects
//! ```
//!
//! # Design Decisions
//! - Wrappers are values implementing `Operation`; clones share state
//! - Calls return `'static` boxed futures so wrappers can hold `Arc` state
//! - Composition is plain wrapping; there is no registry

pub mod context;
pub mod error;
pub mod ext;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};

pub use context::Context;
pub use error::{CallError, ContextError, ErrorKind};
pub use ext::OperationExt;

/// Result of one call through an operation.
pub type Outcome<T, E> = Result<T, CallError<E>>;

/// A cancellable unit of work producing a value or an error.
pub trait Operation: Send + Sync + 'static {
    type Output: Send + 'static;
    type Error: Send + 'static;

    fn call(&self, ctx: Context) -> BoxFuture<'static, Outcome<Self::Output, Self::Error>>;
}

/// Type-erased, shareable operation.
pub type BoxOperation<T, E> = Arc<dyn Operation<Output = T, Error = E>>;

impl<O> Operation for Arc<O>
where
    O: Operation + ?Sized,
{
    type Output = O::Output;
    type Error = O::Error;

    fn call(&self, ctx: Context) -> BoxFuture<'static, Outcome<Self::Output, Self::Error>> {
        (**self).call(ctx)
    }
}

/// Adapt an async closure into an [`Operation`].
///
/// ```
/// use stability_patterns::operation::{operation_fn, CallError, Context, Operation};
///
/// let op = operation_fn(|_ctx: Context| async { Ok::<_, CallError<()>>("pong") });
/// # let _ = op;
/// ```
pub fn operation_fn<F>(f: F) -> OperationFn<F> {
    OperationFn { f }
}

/// Operation backed by a closure. See [`operation_fn`].
#[derive(Clone, Copy)]
pub struct OperationFn<F> {
    f: F,
}

impl<F, Fut, T, E> Operation for OperationFn<F>
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Outcome<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    type Output = T;
    type Error = E;

    fn call(&self, ctx: Context) -> BoxFuture<'static, Outcome<T, E>> {
        (self.f)(ctx).boxed()
    }
}

impl<F> fmt::Debug for OperationFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationFn").finish_non_exhaustive()
    }
}
