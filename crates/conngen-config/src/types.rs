// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! Each struct maps to a section of `conngen_configuration.toml`. Every field
//! has a default, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

/// Accepted `provider.file_mode` values
pub const FILE_MODES: [&str; 3] = ["read_contents", "pass_path", "reject"];

/// Accepted `logging.level` values
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Accepted `logging.format` values
pub const LOG_FORMATS: [&str; 2] = ["text", "json"];

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnGenConfig {
    pub provider: ProviderConfig,
    pub logging: LoggingConfig,
}

/// Connectivity library selection
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Library used when a description names none
    pub default_library: String,
    /// How file descriptions reach libraries without a file parser
    pub file_mode: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            default_library: "linktable".to_string(),
            file_mode: "read_contents".to_string(),
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    /// Crates logged at debug level regardless of `level`
    pub debug_crates: Vec<String>,
    /// Directory for rotated log files (file-logging builds only)
    pub log_dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
            debug_crates: Vec::new(),
            log_dir: "logs".to_string(),
        }
    }
}
