// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # conngen - Connection Generator Adapter Protocol
//!
//! Lets a parallel simulator pull synaptic connectivity out of a
//! connectivity-description engine, one worker partition at a time.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! conngen = "0.1"  # Default: built-in link-table engine
//! ```
//!
//! ```rust,no_run
//! use conngen::prelude::*;
//!
//! let config = conngen::config::load_config(None, None)?;
//! let registry = conngen::runtime::bootstrap(&config)?;
//!
//! let handle = registry.parse_text(None, "0 1 0.5\n1 0 0.25\n")?;
//! let mut gen = ConnectionGenerator::new(handle);
//! let scheme = PartitionScheme::round_robin(4, 2, 2)?;
//! gen.set_masks(scheme.masks(), 0)?;
//! for link in gen.links()? {
//!     let link = link?;
//!     println!("{} -> {} {:?}", link.source, link.target, link.values);
//! }
//! conngen::runtime::shutdown();
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Feature Flags
//! - **`builtin-engine`** (default): register the in-process `linktable` engine
//!   during bootstrap
//! - **`file-logging`**: daily-rotated log files
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: conngen-config, conngen-observability      │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Protocol: conngen-core                                 │
//! │  (IntervalSet, Mask, partitioning, generator, registry) │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Providers: conngen-engine (or any ConnectionSet impl)  │
//! └─────────────────────────────────────────────────────────┘
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod runtime;

pub use conngen_config as config;
pub use conngen_core as protocol;
pub use conngen_observability as observability;

#[cfg(feature = "builtin-engine")]
pub use conngen_engine as engine;

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use conngen_core::{
        ConnGenError, ConnGenResult, ConnectionGenerator, ConnectionSet, GeneratorRegistry,
        Index, IntervalSet, IterationState, Link, LinkCursor, Mask, PartitionScheme,
        ProviderHandle,
    };

    #[cfg(feature = "builtin-engine")]
    pub use conngen_engine::{AllToAll, ExplicitSet, OneToOne, ValueSet};
}
