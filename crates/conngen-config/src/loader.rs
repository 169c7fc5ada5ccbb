// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Three tiers, later ones winning:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, ConnGenConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// File name searched for when no path is given
pub const CONFIG_FILE_NAME: &str = "conngen_configuration.toml";

/// Environment variable naming an explicit configuration file
pub const CONFIG_PATH_ENV: &str = "CONNGEN_CONFIG_PATH";

/// Find the configuration file
///
/// Search order:
/// 1. `CONNGEN_CONFIG_PATH` environment variable
/// 2. Current working directory
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by {} not found: {}",
            CONFIG_PATH_ENV,
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(found) = search_paths.iter().find(|p| p.exists()) {
        return Ok(found.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet {} to specify a custom location.",
        CONFIG_FILE_NAME, search_list, CONFIG_PATH_ENV
    )))
}

/// Load configuration from a TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if config file is not found or contains invalid TOML.
/// Values are not validated here; see [`crate::validate_config`].
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<ConnGenConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };
    let content = fs::read_to_string(&config_file)?;
    load_config_str(&content, cli_args)
}

/// Load configuration from TOML text, applying the same overrides as [`load_config`]
pub fn load_config_str(
    content: &str,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<ConnGenConfig> {
    let mut config: ConnGenConfig = toml::from_str(content)?;
    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }
    Ok(config)
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `CONNGEN_DEFAULT_LIBRARY` -> `provider.default_library`
/// - `CONNGEN_FILE_MODE` -> `provider.file_mode`
/// - `CONNGEN_LOG_LEVEL` -> `logging.level`
/// - `CONNGEN_LOG_FORMAT` -> `logging.format`
pub fn apply_environment_overrides(config: &mut ConnGenConfig) {
    if let Ok(value) = env::var("CONNGEN_DEFAULT_LIBRARY") {
        config.provider.default_library = value;
    }
    if let Ok(value) = env::var("CONNGEN_FILE_MODE") {
        config.provider.file_mode = value.to_lowercase();
    }
    if let Ok(value) = env::var("CONNGEN_LOG_LEVEL") {
        config.logging.level = value.to_lowercase();
    }
    if let Ok(value) = env::var("CONNGEN_LOG_FORMAT") {
        config.logging.format = value.to_lowercase();
    }
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - CLI arguments, e.g. `{"default_library": "linktable", "log_level": "debug"}`
pub fn apply_cli_overrides(config: &mut ConnGenConfig, cli_args: &HashMap<String, String>) {
    if let Some(value) = cli_args.get("default_library") {
        config.provider.default_library = value.clone();
    }
    if let Some(value) = cli_args.get("file_mode") {
        config.provider.file_mode = value.to_lowercase();
    }
    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.to_lowercase();
    }
    if let Some(value) = cli_args.get("log_format") {
        config.logging.format = value.to_lowercase();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const OVERRIDE_VARS: [&str; 4] = [
        "CONNGEN_DEFAULT_LIBRARY",
        "CONNGEN_FILE_MODE",
        "CONNGEN_LOG_LEVEL",
        "CONNGEN_LOG_FORMAT",
    ];

    fn clear_override_vars() {
        for var in OVERRIDE_VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom_config.toml");
        File::create(&config_path).unwrap();

        env::set_var(CONFIG_PATH_ENV, config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var(CONFIG_PATH_ENV);

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_find_config_file_env_var_missing() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        env::set_var(CONFIG_PATH_ENV, "/nonexistent/conngen.toml");
        let result = find_config_file();
        env::remove_var(CONFIG_PATH_ENV);

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_minimal_config() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        clear_override_vars();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[provider]").unwrap();
        writeln!(file, "file_mode = \"pass_path\"").unwrap();
        writeln!(file, "[logging]").unwrap();
        writeln!(file, "debug_crates = [\"conngen-core\"]").unwrap();

        let config = load_config(Some(&config_path), None).unwrap();

        assert_eq!(config.provider.file_mode, "pass_path");
        assert_eq!(config.provider.default_library, "linktable");
        assert_eq!(config.logging.debug_crates, vec!["conngen-core"]);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_invalid_toml() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let result = load_config_str("[provider\nfile_mode = 3", None);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = ConnGenConfig::default();

        env::set_var("CONNGEN_DEFAULT_LIBRARY", "csa");
        env::set_var("CONNGEN_LOG_FORMAT", "JSON");
        apply_environment_overrides(&mut config);
        clear_override_vars();

        assert_eq!(config.provider.default_library, "csa");
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = ConnGenConfig::default();
        let mut cli_args = HashMap::new();
        cli_args.insert("file_mode".to_string(), "Reject".to_string());
        cli_args.insert("log_level".to_string(), "debug".to_string());

        apply_cli_overrides(&mut config, &cli_args);

        assert_eq!(config.provider.file_mode, "reject");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[provider]").unwrap();
        writeln!(file, "default_library = \"file-lib\"").unwrap();
        writeln!(file, "[logging]").unwrap();
        writeln!(file, "level = \"warn\"").unwrap();

        env::set_var("CONNGEN_DEFAULT_LIBRARY", "env-lib");
        env::set_var("CONNGEN_LOG_LEVEL", "error");

        let mut cli_args = HashMap::new();
        cli_args.insert("default_library".to_string(), "cli-lib".to_string());

        let config = load_config(Some(&config_path), Some(&cli_args)).unwrap();
        clear_override_vars();

        // CLI wins for the library, env wins for the level (no CLI override)
        assert_eq!(config.provider.default_library, "cli-lib");
        assert_eq!(config.logging.level, "error");
    }
}
