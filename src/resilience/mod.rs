//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call through a pipeline:
//!     → retries.rs (re-invoke on failure, constant delay)
//!     → circuit_breaker.rs (fail fast after repeated failures)
//!     → timeouts.rs (race a blocking call against the context)
//! ```
//!
//! # Design Decisions
//! - Every wait honours the caller's context
//! - Retries only for idempotent operations
//! - Circuit breaker prevents cascading failures
//! - All resilience logic is composable by wrapping

pub mod backoff;
pub mod circuit_breaker;
pub mod retries;
pub mod timeouts;

pub use circuit_breaker::{Breaker, CircuitState};
pub use retries::Retry;
pub use timeouts::Timeout;
