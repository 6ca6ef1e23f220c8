//! Configuration schema definitions.
//!
//! One section per wrapper. All types derive Serde traits for
//! deserialization from TOML, and every field has a default so partial
//! files are valid. Durations are stored as integer milliseconds.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for a wrapper pipeline.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct StabilityConfig {
    /// Circuit breaker settings.
    pub breaker: BreakerConfig,

    /// Token bucket settings.
    pub throttle: ThrottleConfig,

    /// Debounce settings.
    pub debounce: DebounceConfig,

    /// Retry settings.
    pub retry: RetryConfig,

    /// Timeout settings.
    pub timeout: TimeoutConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BreakerConfig {
    /// Wrap calls in a breaker.
    pub enabled: bool,

    /// Consecutive failures before the circuit trips.
    pub threshold: u32,

    /// Cooldown unit in milliseconds; the cooldown is `unit * 2^(overflow+1)`.
    pub cooldown_unit_ms: u64,
}

impl BreakerConfig {
    pub fn cooldown_unit(&self) -> Duration {
        Duration::from_millis(self.cooldown_unit_ms)
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 5,
            cooldown_unit_ms: 1000,
        }
    }
}

/// Token bucket configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Wrap calls in a throttle.
    pub enabled: bool,

    /// Bucket capacity (burst size).
    pub max_tokens: u32,

    /// Tokens added per refill tick.
    pub refill: u32,

    /// Refill tick interval in milliseconds.
    pub refill_interval_ms: u64,
}

impl ThrottleConfig {
    pub fn refill_interval(&self) -> Duration {
        Duration::from_millis(self.refill_interval_ms)
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_tokens: 50,
            refill: 10,
            refill_interval_ms: 1000,
        }
    }
}

/// Which debounce policy to apply.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DebounceMode {
    /// Leading edge, later calls in the window get the cached outcome.
    #[default]
    First,
    /// Leading edge, a new call preempts the previous one.
    FirstContext,
    /// Trailing edge, only the last call of a burst runs.
    Last,
}

/// Debounce configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DebounceConfig {
    /// Wrap calls in a debouncer.
    pub enabled: bool,

    pub mode: DebounceMode,

    /// Debounce window in milliseconds.
    pub window_ms: u64,
}

impl DebounceConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: DebounceMode::First,
            window_ms: 250,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    /// Enable retries. Only for idempotent operations.
    pub enabled: bool,

    /// Retries after the first attempt.
    pub max_retries: u32,

    /// Constant delay between attempts in milliseconds.
    pub delay_ms: u64,
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_retries: 3,
            delay_ms: 100,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Attach a deadline to each call.
    pub enabled: bool,

    /// Skip starting the slow call when the context is already done.
    pub precheck: bool,

    /// Per-call deadline in milliseconds.
    pub deadline_ms: u64,
}

impl TimeoutConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            precheck: true,
            deadline_ms: 5000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of human-readable ones.
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}
