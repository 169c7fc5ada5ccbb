// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Process-level wiring: configuration → logging → global registry

use std::sync::Arc;

use anyhow::{Context, Result};
use conngen_config::{validate_config, ConnGenConfig, ProviderConfig};
use conngen_core::registry::{self, FileParseMode, GeneratorRegistry};
use conngen_core::ConnGenError;
use conngen_observability::{CrateDebugFlags, LogFormat, LoggingGuard};
use tracing::info;

/// Registry configured from the `[provider]` section
///
/// With the `builtin-engine` feature the `linktable` library is registered.
pub fn build_registry(config: &ProviderConfig) -> Result<GeneratorRegistry> {
    let file_mode: FileParseMode = config
        .file_mode
        .parse()
        .map_err(anyhow::Error::msg)
        .context("Invalid provider.file_mode")?;

    let registry = GeneratorRegistry::new();
    registry.set_default_library(Some(config.default_library.clone()));
    registry.set_file_mode(file_mode);

    #[cfg(feature = "builtin-engine")]
    conngen_engine::register(&registry);

    Ok(registry)
}

/// Validate `config` and set up the process-wide registry once
///
/// A registry that is already installed is returned unchanged.
pub fn bootstrap(config: &ConnGenConfig) -> Result<Arc<GeneratorRegistry>> {
    validate_config(config)?;
    let registry = registry::global_or_init(|| {
        build_registry(&config.provider)
            .map_err(|e| ConnGenError::ProviderUnavailable(format!("{:#}", e)))
    })?;
    info!(
        "conngen {} ready (default library '{}', file mode {})",
        crate::VERSION,
        config.provider.default_library,
        registry.file_mode()
    );
    Ok(registry)
}

/// Release the process-wide registry
pub fn shutdown() -> bool {
    registry::teardown()
}

/// Observability settings derived from the `[logging]` section
pub fn logging_config(config: &ConnGenConfig) -> Result<conngen_observability::LoggingConfig> {
    let format: LogFormat = config
        .logging
        .format
        .parse()
        .map_err(anyhow::Error::msg)
        .context("Invalid logging.format")?;
    Ok(conngen_observability::LoggingConfig {
        level: config.logging.level.clone(),
        format,
        log_dir: Some(config.logging.log_dir.clone().into()),
        ..Default::default()
    })
}

/// Install the global subscriber from `config` plus command-line debug flags
pub fn init_logging(config: &ConnGenConfig, cli_flags: &CrateDebugFlags) -> Result<LoggingGuard> {
    let mut flags = CrateDebugFlags::from_crates(&config.logging.debug_crates);
    flags.merge(cli_flags);
    conngen_observability::init_logging(&flags, &logging_config(config)?)
}
