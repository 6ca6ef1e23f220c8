//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (thresholds, capacities, durations > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Disabled sections are not checked
//! - Validation is pure function: StabilityConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;

use crate::config::schema::StabilityConfig;

/// Log levels accepted in `observability.log_level`.
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{section}.{field} must be greater than zero")]
    MustBePositive {
        section: &'static str,
        field: &'static str,
    },

    #[error("unknown log level '{0}'")]
    UnknownLogLevel(String),
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &StabilityConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut positive = |section: &'static str, field: &'static str, value: u64| {
        if value == 0 {
            errors.push(ValidationError::MustBePositive { section, field });
        }
    };

    if config.breaker.enabled {
        positive("breaker", "threshold", config.breaker.threshold.into());
        positive("breaker", "cooldown_unit_ms", config.breaker.cooldown_unit_ms);
    }

    if config.throttle.enabled {
        positive("throttle", "max_tokens", config.throttle.max_tokens.into());
        positive("throttle", "refill", config.throttle.refill.into());
        positive("throttle", "refill_interval_ms", config.throttle.refill_interval_ms);
    }

    if config.debounce.enabled {
        positive("debounce", "window_ms", config.debounce.window_ms);
    }

    if config.timeout.enabled {
        positive("timeout", "deadline_ms", config.timeout.deadline_ms);
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&StabilityConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = StabilityConfig::default();
        config.breaker.threshold = 0;
        config.throttle.refill_interval_ms = 0;
        config.observability.log_level = "loud".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::MustBePositive {
            section: "breaker",
            field: "threshold",
        }));
        assert!(errors.contains(&ValidationError::UnknownLogLevel("loud".into())));
    }

    #[test]
    fn test_disabled_sections_are_skipped() {
        let mut config = StabilityConfig::default();
        config.throttle.enabled = false;
        config.throttle.max_tokens = 0;
        config.debounce.window_ms = 0;
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn test_error_display() {
        let err = ValidationError::MustBePositive {
            section: "debounce",
            field: "window_ms",
        };
        assert_eq!(err.to_string(), "debounce.window_ms must be greater than zero");
    }
}
