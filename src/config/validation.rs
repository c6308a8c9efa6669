//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (notification depth > 0)
//! - Validate the log level names a real level
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: TreeConfig → Result<(), Vec<ValidationError>>
//! - Runs before a store accepts the config

use std::fmt;

use crate::config::schema::TreeConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem with a [`TreeConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted name of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Check a config, collecting every problem found.
pub fn validate_config(config: &TreeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.notify.max_depth == 0 {
        errors.push(ValidationError {
            field: "notify.max_depth",
            message: "must be at least 1".to_string(),
        });
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError {
            field: "observability.log_level",
            message: format!(
                "unknown level `{}`, expected one of {}",
                config.observability.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
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
        assert!(validate_config(&TreeConfig::default()).is_ok());
    }

    #[test]
    fn test_reports_all_errors() {
        let mut config = TreeConfig::default();
        config.notify.max_depth = 0;
        config.observability.log_level = "loud".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "notify.max_depth");
        assert_eq!(errors[1].field, "observability.log_level");
    }

    #[test]
    fn test_log_level_is_case_insensitive() {
        let mut config = TreeConfig::default();
        config.observability.log_level = "DEBUG".into();
        assert!(validate_config(&config).is_ok());
    }
}
