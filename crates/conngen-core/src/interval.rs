// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Interval sets - compact, optionally strided sets of node indices.

An [`IntervalSet`] stores an ordered list of closed ranges plus a single
stride (`skip`) applied to every range. With `skip == 1` each range denotes
every integer in `[first, last]`; with `skip > 1` only
`first, first + skip, first + 2·skip, …` up to `last` are members.

Simulators use the strided form to describe round-robin neuron distribution
(worker `r` of `N` owns `r, r + N, r + 2N, …`) without materializing it.
*/

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::{ConnGenError, ConnGenResult};

/// Node index (source or target) in the connectivity index space
pub type Index = u64;

/// Closed range `[first, last]` of node indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClosedRange {
    pub first: Index,
    pub last: Index,
}

impl ClosedRange {
    pub const fn new(first: Index, last: Index) -> Self {
        Self { first, last }
    }

    /// Single-element range `[i, i]`
    pub const fn point(i: Index) -> Self {
        Self { first: i, last: i }
    }

    pub fn contains(&self, i: Index) -> bool {
        self.first <= i && i <= self.last
    }
}

impl From<(Index, Index)> for ClosedRange {
    fn from((first, last): (Index, Index)) -> Self {
        Self { first, last }
    }
}

/// Ordered set of closed ranges with a uniform stride
///
/// Immutable after construction. Invariants (checked by [`IntervalSet::new`]):
/// - `first <= last` for every range
/// - ranges ascending and non-overlapping
/// - `skip >= 1`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawIntervalSet", into = "RawIntervalSet")]
pub struct IntervalSet {
    ranges: Vec<ClosedRange>,
    skip: Index,
}

#[derive(Serialize, Deserialize)]
struct RawIntervalSet {
    ranges: Vec<ClosedRange>,
    #[serde(default = "default_skip")]
    skip: Index,
}

fn default_skip() -> Index {
    1
}

impl TryFrom<RawIntervalSet> for IntervalSet {
    type Error = ConnGenError;

    fn try_from(raw: RawIntervalSet) -> ConnGenResult<Self> {
        IntervalSet::new(raw.ranges, raw.skip)
    }
}

impl From<IntervalSet> for RawIntervalSet {
    fn from(set: IntervalSet) -> Self {
        RawIntervalSet {
            ranges: set.ranges,
            skip: set.skip,
        }
    }
}

impl Default for IntervalSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl IntervalSet {
    /// Build an interval set from already-ordered ranges and a stride
    ///
    /// # Errors
    /// `InvalidIntervals` if a range is reversed, ranges overlap or are out of
    /// order, or `skip` is zero.
    pub fn new(ranges: Vec<ClosedRange>, skip: Index) -> ConnGenResult<Self> {
        if skip == 0 {
            return Err(ConnGenError::InvalidIntervals(
                "skip must be at least 1".to_string(),
            ));
        }
        for range in &ranges {
            if range.first > range.last {
                return Err(ConnGenError::InvalidIntervals(format!(
                    "malformed interval ({}, {})",
                    range.first, range.last
                )));
            }
        }
        for pair in ranges.windows(2) {
            if pair[1].first <= pair[0].last {
                return Err(ConnGenError::InvalidIntervals(format!(
                    "intervals ({}, {}) and ({}, {}) overlap or are out of order",
                    pair[0].first, pair[0].last, pair[1].first, pair[1].last
                )));
            }
        }
        Ok(Self { ranges, skip })
    }

    /// The set with no members
    pub const fn empty() -> Self {
        Self {
            ranges: Vec::new(),
            skip: 1,
        }
    }

    /// Unit-stride set covering `[first, last]`
    pub fn single(first: Index, last: Index) -> ConnGenResult<Self> {
        Self::new(vec![ClosedRange::new(first, last)], 1)
    }

    /// Strided set `first, first + skip, …` not exceeding `last`
    pub fn strided(first: Index, last: Index, skip: Index) -> ConnGenResult<Self> {
        Self::new(vec![ClosedRange::new(first, last)], skip)
    }

    /// Unit-stride set from unordered ranges
    ///
    /// Ranges are sorted, then overlapping and adjacent ranges are merged.
    pub fn from_ranges<I, R>(ranges: I) -> ConnGenResult<Self>
    where
        I: IntoIterator<Item = R>,
        R: Into<ClosedRange>,
    {
        let mut sorted: Vec<ClosedRange> = ranges.into_iter().map(Into::into).collect();
        if let Some(bad) = sorted.iter().find(|r| r.first > r.last) {
            return Err(ConnGenError::InvalidIntervals(format!(
                "malformed interval ({}, {})",
                bad.first, bad.last
            )));
        }
        sorted.sort();
        Ok(Self {
            ranges: coalesce(sorted),
            skip: 1,
        })
    }

    /// Unit-stride set from individual indices (duplicates ignored)
    pub fn from_indices<I>(indices: I) -> Self
    where
        I: IntoIterator<Item = Index>,
    {
        let mut points: Vec<Index> = indices.into_iter().collect();
        points.sort_unstable();
        points.dedup();
        Self {
            ranges: coalesce(points.into_iter().map(ClosedRange::point).collect()),
            skip: 1,
        }
    }

    pub fn ranges(&self) -> &[ClosedRange] {
        &self.ranges
    }

    pub fn skip(&self) -> Index {
        self.skip
    }

    pub fn is_strided(&self) -> bool {
        self.skip > 1
    }

    /// Number of members (saturates at `Index::MAX`)
    pub fn len(&self) -> Index {
        self.ranges.iter().fold(0, |acc: Index, r| {
            acc.saturating_add(((r.last - r.first) / self.skip).saturating_add(1))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn contains(&self, i: Index) -> bool {
        let pos = self.ranges.partition_point(|r| r.last < i);
        match self.ranges.get(pos) {
            Some(r) => r.first <= i && (i - r.first) % self.skip == 0,
            None => false,
        }
    }

    /// Smallest member
    pub fn min(&self) -> Option<Index> {
        self.ranges.first().map(|r| r.first)
    }

    /// Largest member (the last stride point of the last range)
    pub fn max(&self) -> Option<Index> {
        self.ranges
            .last()
            .map(|r| r.first + (r.last - r.first) / self.skip * self.skip)
    }

    /// Iterate members in ascending order
    pub fn iter(&self) -> impl Iterator<Item = Index> + '_ {
        let step = stride_step(self.skip);
        self.ranges
            .iter()
            .flat_map(move |r| (r.first..=r.last).step_by(step))
    }

    /// Membership expansion handed to providers when building a mask
    ///
    /// Unit stride returns the ranges unchanged. A strided set is materialized
    /// into one single-element range `(j, j)` per member, so the cost is
    /// proportional to the member count. An empty set expands to an empty list.
    pub fn expand(&self) -> Vec<ClosedRange> {
        if self.skip == 1 {
            return self.ranges.clone();
        }
        self.iter().map(ClosedRange::point).collect()
    }

    /// Equivalent set with unit stride
    pub fn to_unit_stride(&self) -> IntervalSet {
        if self.skip == 1 {
            return self.clone();
        }
        Self {
            ranges: self.expand(),
            skip: 1,
        }
    }

    /// Members present in both sets
    pub fn intersection(&self, other: &IntervalSet) -> IntervalSet {
        let a = self.to_unit_stride();
        let b = other.to_unit_stride();
        let mut res = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < a.ranges.len() && j < b.ranges.len() {
            let (x, y) = (a.ranges[i], b.ranges[j]);
            let lower = x.first.max(y.first);
            let upper = x.last.min(y.last);
            if lower <= upper {
                res.push(ClosedRange::new(lower, upper));
            }
            if x.last <= y.last {
                i += 1;
            } else {
                j += 1;
            }
        }
        Self {
            ranges: res,
            skip: 1,
        }
    }

    /// Members present in either set
    pub fn union(&self, other: &IntervalSet) -> IntervalSet {
        let a = self.to_unit_stride();
        let b = other.to_unit_stride();
        let mut merged: Vec<ClosedRange> = Vec::with_capacity(a.ranges.len() + b.ranges.len());
        let (mut i, mut j) = (0, 0);
        while i < a.ranges.len() || j < b.ranges.len() {
            let take_a = match (a.ranges.get(i), b.ranges.get(j)) {
                (Some(x), Some(y)) => x.first <= y.first,
                (Some(_), None) => true,
                _ => false,
            };
            if take_a {
                merged.push(a.ranges[i]);
                i += 1;
            } else {
                merged.push(b.ranges[j]);
                j += 1;
            }
        }
        Self {
            ranges: coalesce(merged),
            skip: 1,
        }
    }
}

impl From<RangeInclusive<Index>> for IntervalSet {
    fn from(range: RangeInclusive<Index>) -> Self {
        let (first, last) = range.into_inner();
        if first > last {
            return Self::empty();
        }
        Self {
            ranges: vec![ClosedRange::new(first, last)],
            skip: 1,
        }
    }
}

/// Merge sorted ranges that overlap or touch
fn coalesce(sorted: Vec<ClosedRange>) -> Vec<ClosedRange> {
    let mut res: Vec<ClosedRange> = Vec::with_capacity(sorted.len());
    for r in sorted {
        match res.last_mut() {
            Some(prev) if r.first <= prev.last.saturating_add(1) => {
                prev.last = prev.last.max(r.last);
            }
            _ => res.push(r),
        }
    }
    res
}

fn stride_step(skip: Index) -> usize {
    usize::try_from(skip).unwrap_or(usize::MAX)
}
