//! Admission subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming call:
//!     → rate_limit.rs (take a token or reject with RateLimited)
//!     → debounce.rs (serve from cache, preempt, or delay until quiet)
//!     → Pass to wrapped operation
//! ```
//!
//! # Design Decisions
//! - Admission decisions are atomic per instance
//! - Admission locks are never held across a slow call, except where
//!   single-flight is the policy (`DebounceFirst`)
//! - Background helpers are bounded: one refill loop per throttle,
//!   one scheduled call per trailing debouncer

pub mod debounce;
pub mod rate_limit;

pub use debounce::{DebounceFirst, DebounceFirstContext, DebounceLast};
pub use rate_limit::Throttle;
