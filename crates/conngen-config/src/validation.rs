// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Checks every field and reports all violations together.

use crate::types::{FILE_MODES, LOG_FORMATS, LOG_LEVELS};
use crate::{ConfigError, ConfigResult, ConnGenConfig};

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every violation
pub fn validate_config(config: &ConnGenConfig) -> ConfigResult<()> {
    let errors = collect_errors(config);
    if errors.is_empty() {
        return Ok(());
    }
    let error_messages = errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n");
    Err(ConfigError::ValidationError(format!(
        "Configuration validation failed:\n{}",
        error_messages
    )))
}

/// Every violation in `config`, in field order
pub fn collect_errors(config: &ConnGenConfig) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();
    validate_provider(config, &mut errors);
    validate_logging(config, &mut errors);
    errors
}

fn validate_provider(config: &ConnGenConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.provider.default_library.trim().is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "provider.default_library".to_string(),
        });
    }
    check_one_of(
        "provider.file_mode",
        &config.provider.file_mode,
        &FILE_MODES,
        errors,
    );
}

fn validate_logging(config: &ConnGenConfig, errors: &mut Vec<ConfigValidationError>) {
    check_one_of("logging.level", &config.logging.level, &LOG_LEVELS, errors);
    check_one_of("logging.format", &config.logging.format, &LOG_FORMATS, errors);
    for name in &config.logging.debug_crates {
        if name.trim().is_empty() || name.contains(char::is_whitespace) {
            errors.push(ConfigValidationError::InvalidValue {
                field: "logging.debug_crates".to_string(),
                reason: format!("'{}' is not a crate name", name),
            });
        }
    }
}

fn check_one_of(
    field: &str,
    value: &str,
    allowed: &[&str],
    errors: &mut Vec<ConfigValidationError>,
) {
    if !allowed.contains(&value) {
        errors.push(ConfigValidationError::InvalidValue {
            field: field.to_string(),
            reason: format!("'{}' (expected one of: {})", value, allowed.join(", ")),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ConnGenConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_file_mode() {
        let mut config = ConnGenConfig::default();
        config.provider.file_mode = "guess".to_string();
        let errors = collect_errors(&config);
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            ConfigValidationError::InvalidValue { field, .. } if field == "provider.file_mode"
        ));
    }

    #[test]
    fn test_all_violations_reported() {
        let mut config = ConnGenConfig::default();
        config.provider.default_library = "  ".to_string();
        config.logging.level = "verbose".to_string();
        config.logging.format = "xml".to_string();
        config.logging.debug_crates = vec!["conngen core".to_string()];

        assert_eq!(collect_errors(&config).len(), 4);
        match validate_config(&config) {
            Err(ConfigError::ValidationError(msg)) => {
                assert!(msg.contains("provider.default_library"));
                assert!(msg.contains("logging.level"));
                assert!(msg.contains("logging.format"));
                assert!(msg.contains("conngen core"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
