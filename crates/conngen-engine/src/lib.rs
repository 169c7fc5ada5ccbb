// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Connection Generator Engine
//!
//! In-process connectivity engine implementing the provider traits of
//! `conngen-core`:
//! - [`ExplicitSet`]: links listed one by one (the `linktable` format)
//! - [`OneToOne`] / [`AllToAll`]: elementary sets with [`ValueSet`] payloads,
//!   partitioned natively
//!
//! [`register`] makes the engine available through a [`GeneratorRegistry`].

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod elementary;
pub mod explicit;
pub mod table;

pub use elementary::{AllToAll, OneToOne, ValueSet};
pub use explicit::ExplicitSet;
pub use table::{parse_table, read_table};

use std::any::Any;

use conngen_core::{
    ConnGenError, ConnGenResult, ConnectionGenerator, GeneratorRegistry, ProviderHandle,
    ProviderLibrary,
};

/// Library name of the link-table format
pub const LINK_TABLE_LIBRARY: &str = "linktable";

/// Adapter name for the engine's own set types
pub const ENGINE_ADAPTER: &str = "conngen-engine";

/// Register the `linktable` library and the engine type adapter
pub fn register(registry: &GeneratorRegistry) {
    registry.register_library(
        ProviderLibrary::new(LINK_TABLE_LIBRARY)
            .with_text_parser(|text| parse_table(text).map(ProviderHandle::new))
            .with_file_parser(|path| read_table(path).map(ProviderHandle::new)),
    );
    registry.register_type(ENGINE_ADAPTER, is_engine_set, adapt_engine_set);
}

fn is_engine_set(candidate: &dyn Any) -> bool {
    candidate.is::<ExplicitSet>() || candidate.is::<OneToOne>() || candidate.is::<AllToAll>()
}

fn adapt_engine_set(candidate: &dyn Any) -> ConnGenResult<ConnectionGenerator> {
    let handle = if let Some(set) = candidate.downcast_ref::<ExplicitSet>() {
        ProviderHandle::new(set.clone())
    } else if let Some(set) = candidate.downcast_ref::<OneToOne>() {
        ProviderHandle::new(set.clone())
    } else if let Some(set) = candidate.downcast_ref::<AllToAll>() {
        ProviderHandle::new(set.clone())
    } else {
        return Err(ConnGenError::Unsupported(
            "object is not an engine connection set".to_string(),
        ));
    };
    Ok(ConnectionGenerator::new(handle))
}
