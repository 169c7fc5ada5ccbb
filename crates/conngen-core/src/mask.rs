// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Masks - rectangular sub-blocks of the source × target index space.
*/

use serde::{Deserialize, Serialize};

use crate::error::ConnGenResult;
use crate::interval::{ClosedRange, Index, IntervalSet};

/// Cartesian product `sources × targets`
///
/// A value object: built once per partition before iteration and shared
/// read-only afterwards. Position in a mask list is the partition index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mask {
    pub sources: IntervalSet,
    pub targets: IntervalSet,
}

impl Mask {
    pub fn new(sources: IntervalSet, targets: IntervalSet) -> Self {
        Self { sources, targets }
    }

    /// Mask covering the whole index space
    pub fn full() -> Self {
        Self {
            sources: IntervalSet::from(0..=Index::MAX),
            targets: IntervalSet::from(0..=Index::MAX),
        }
    }

    pub fn contains(&self, source: Index, target: Index) -> bool {
        self.sources.contains(source) && self.targets.contains(target)
    }

    /// Number of (source, target) pairs covered (saturating)
    pub fn len(&self) -> Index {
        self.sources.len().saturating_mul(self.targets.len())
    }

    /// A mask selects nothing unless both sides are non-empty
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty() || self.targets.is_empty()
    }

    /// Expanded representation consumed by providers
    pub fn cross(&self) -> CrossMask {
        CrossMask {
            sources: self.sources.expand(),
            targets: self.targets.expand(),
        }
    }
}

/// Provider-facing form of a [`Mask`]: both sides as plain closed ranges
///
/// Built by [`Mask::cross`]; ranges are ascending and non-overlapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossMask {
    pub sources: Vec<ClosedRange>,
    pub targets: Vec<ClosedRange>,
}

impl CrossMask {
    pub fn contains(&self, source: Index, target: Index) -> bool {
        in_ranges(&self.sources, source) && in_ranges(&self.targets, target)
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty() || self.targets.is_empty()
    }

    /// Source side as a unit-stride interval set
    ///
    /// # Errors
    /// `InvalidIntervals` if a hand-built range has `first > last`.
    pub fn source_set(&self) -> ConnGenResult<IntervalSet> {
        IntervalSet::from_ranges(self.sources.iter().copied())
    }

    /// Target side as a unit-stride interval set
    pub fn target_set(&self) -> ConnGenResult<IntervalSet> {
        IntervalSet::from_ranges(self.targets.iter().copied())
    }
}

fn in_ranges(ranges: &[ClosedRange], i: Index) -> bool {
    let pos = ranges.partition_point(|r| r.last < i);
    ranges.get(pos).is_some_and(|r| r.first <= i)
}
