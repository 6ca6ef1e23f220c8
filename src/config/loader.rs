//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::StabilityConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<StabilityConfig, ConfigError> {
    let config: StabilityConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<StabilityConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content)?;

    tracing::debug!(path = %path.display(), "Configuration loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::DebounceMode;

    #[test]
    fn test_parse_partial_config() {
        let config = parse_config(
            r#"
            [breaker]
            threshold = 2

            [throttle]
            max_tokens = 5
            refill = 1
            refill_interval_ms = 200

            [debounce]
            enabled = true
            mode = "first_context"
            window_ms = 50
            "#,
        )
        .unwrap();

        assert_eq!(config.breaker.threshold, 2);
        assert_eq!(config.breaker.cooldown_unit_ms, 1000);
        assert_eq!(config.throttle.refill_interval().as_millis(), 200);
        assert_eq!(config.debounce.mode, DebounceMode::FirstContext);
        assert_eq!(config.retry.max_retries, 3);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        assert_eq!(parse_config("").unwrap(), StabilityConfig::default());
    }

    #[test]
    fn test_parse_error() {
        let err = parse_config("[breaker]\nthreshold = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation_error() {
        let err = parse_config("[retry]\nmax_retries = 1\n[timeout]\ndeadline_ms = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert_eq!(
            err.to_string(),
            "Validation failed: timeout.deadline_ms must be greater than zero"
        );
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config(Path::new("does-not-exist.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
