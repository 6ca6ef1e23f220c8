//! Composable call-admission wrappers.
//!
//! Each wrapper takes an [`Operation`](operation::Operation) and returns a
//! same-shaped operation gated by a policy: circuit breaking, token bucket
//! throttling, debouncing, bounded retry, or deadline enforcement.
//!
//! ```text
//! retry(breaker(throttle(timeout(call))))
//! ```

pub mod admission;
pub mod config;
pub mod observability;
pub mod operation;
pub mod resilience;

pub use admission::{DebounceFirst, DebounceFirstContext, DebounceLast, Throttle};
pub use config::StabilityConfig;
pub use operation::{
    operation_fn, BoxOperation, CallError, Context, ContextError, ErrorKind, Operation,
    OperationExt, Outcome,
};
pub use resilience::{Breaker, CircuitState, Retry, Timeout};
