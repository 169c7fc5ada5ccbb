// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Connection Generator Core
//!
//! Adapter protocol between connectivity description engines and a simulator
//! that pulls synaptic links out of them in parallel.
//!
//! ## Building blocks
//! - [`IntervalSet`] / [`Mask`]: rectangular sub-blocks of the source × target
//!   index space
//! - [`PartitionScheme`]: ordered, disjoint mask lists assigning links to workers
//! - [`ConnectionGenerator`]: `set_masks` → `start` → `next_*` iteration state machine
//! - [`GeneratorRegistry`]: named libraries and type adapters
//!
//! ## Threading
//! Every call into an engine runs inside one process-wide reentrant lock
//! ([`lock`]). Interval and mask arithmetic never takes it.
//!
//! ## Example
//! ```ignore
//! let mut gen = ConnectionGenerator::new(handle);
//! let scheme = PartitionScheme::round_robin(4, n_sources, n_targets)?;
//! gen.set_masks(scheme.masks(), rank)?;
//! gen.start()?;
//! let mut weight_delay = [0.0; 2];
//! while let Some((source, target)) = gen.next_into(&mut weight_delay)? {
//!     connect(source, target, weight_delay[0], weight_delay[1]);
//! }
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod generator;
pub mod handle;
pub mod interval;
pub mod link;
pub mod lock;
pub mod mask;
pub mod provider;
pub mod registry;
pub mod scheme;

pub use error::{ConnGenError, ConnGenResult};
pub use generator::{ConnectionGenerator, IterationState, Links};
pub use handle::{ProviderCursor, ProviderHandle};
pub use interval::{ClosedRange, Index, IntervalSet};
pub use link::{Link, PayloadValue, RawLink};
pub use mask::{CrossMask, Mask};
pub use provider::{partition_view, ConnectionSet, LinkCursor, MaskedSet};
pub use registry::{
    FileParseMode, FnAdapter, GeneratorAdapter, GeneratorRegistry, HandleAdapter,
    ProviderLibrary,
};
pub use scheme::PartitionScheme;
