//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All wrappers produce:
//!     → tracing events (admission, rejection, retry, circuit transitions)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout, text or JSON)
//! ```
//!
//! # Design Decisions
//! - Structured fields, not formatted strings
//! - Rejections log at debug, circuit trips and retries at warn
//! - No metrics exporter; hosts attach their own subscriber layers

pub mod logging;

pub use logging::init_logging;
