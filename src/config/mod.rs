//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → StabilityConfig (validated, immutable)
//!     → `from_config` constructors on each wrapper
//! ```
//!
//! # Design Decisions
//! - Config is optional; every wrapper also has a plain constructor
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::StabilityConfig;
pub use schema::{
    BreakerConfig, DebounceConfig, DebounceMode, ObservabilityConfig, RetryConfig,
    ThrottleConfig, TimeoutConfig,
};
