// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Partitioning schemes - ordered mask lists assigning links to workers.

A well-formed scheme has pairwise disjoint masks whose union covers the
index space, so every link is produced by exactly one partition. Generators
do not enforce this; [`PartitionScheme::verify`] is the opt-in check.
*/

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConnGenError, ConnGenResult};
use crate::interval::{Index, IntervalSet};
use crate::mask::Mask;

/// Ordered list of masks; partition `i` is mask `i`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionScheme {
    masks: Vec<Mask>,
}

impl PartitionScheme {
    pub fn new(masks: Vec<Mask>) -> Self {
        Self { masks }
    }

    /// Round-robin source distribution: worker `r` owns sources `r, r + N, …`
    ///
    /// Every worker sees all targets. This matches how simulators spread
    /// neurons over processes.
    pub fn round_robin(
        workers: usize,
        source_count: Index,
        target_count: Index,
    ) -> ConnGenResult<Self> {
        check_workers(workers)?;
        let targets = span(target_count);
        let stride = workers as Index;
        let masks = (0..stride)
            .map(|r| {
                let sources = if r < source_count {
                    IntervalSet::strided(r, source_count - 1, stride)?
                } else {
                    IntervalSet::empty()
                };
                Ok(Mask::new(sources, targets.clone()))
            })
            .collect::<ConnGenResult<Vec<_>>>()?;
        debug!(
            "Built round-robin scheme: {} workers over {} sources",
            workers, source_count
        );
        Ok(Self { masks })
    }

    /// Contiguous source blocks of (nearly) equal size, all targets per block
    pub fn blocks(workers: usize, source_count: Index, target_count: Index) -> ConnGenResult<Self> {
        check_workers(workers)?;
        let targets = span(target_count);
        let masks = split(source_count, workers)
            .into_iter()
            .map(|sources| Mask::new(sources, targets.clone()))
            .collect();
        Ok(Self { masks })
    }

    /// Rectangular tiles, row-major: `rows` source blocks × `cols` target blocks
    pub fn grid(
        rows: usize,
        cols: usize,
        source_count: Index,
        target_count: Index,
    ) -> ConnGenResult<Self> {
        check_workers(rows)?;
        check_workers(cols)?;
        let target_blocks = split(target_count, cols);
        let mut masks = Vec::with_capacity(rows * cols);
        for sources in split(source_count, rows) {
            for targets in &target_blocks {
                masks.push(Mask::new(sources.clone(), targets.clone()));
            }
        }
        Ok(Self { masks })
    }

    pub fn masks(&self) -> &[Mask] {
        &self.masks
    }

    pub fn into_masks(self) -> Vec<Mask> {
        self.masks
    }

    pub fn len(&self) -> usize {
        self.masks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    /// Mask of partition `local`
    pub fn mask(&self, local: usize) -> ConnGenResult<&Mask> {
        self.masks.get(local).ok_or(ConnGenError::InvalidPartition {
            local,
            count: self.masks.len(),
        })
    }

    /// Index of the partition owning link `(source, target)`, if any
    pub fn owner(&self, source: Index, target: Index) -> Option<usize> {
        self.masks.iter().position(|m| m.contains(source, target))
    }

    /// Check disjointness and coverage of `[0, source_count) × [0, target_count)`
    ///
    /// Parts of a mask outside the space are ignored.
    pub fn verify(&self, source_count: Index, target_count: Index) -> ConnGenResult<()> {
        if self.masks.is_empty() {
            return Err(ConnGenError::InvalidScheme("no masks".to_string()));
        }
        let space_sources = span(source_count);
        let space_targets = span(target_count);
        let clipped: Vec<(IntervalSet, IntervalSet)> = self
            .masks
            .iter()
            .map(|m| {
                (
                    m.sources.intersection(&space_sources),
                    m.targets.intersection(&space_targets),
                )
            })
            .collect();

        for (i, a) in clipped.iter().enumerate() {
            for (j, b) in clipped.iter().enumerate().skip(i + 1) {
                let sources = a.0.intersection(&b.0);
                let targets = a.1.intersection(&b.1);
                if !sources.is_empty() && !targets.is_empty() {
                    return Err(ConnGenError::InvalidScheme(format!(
                        "masks {} and {} overlap",
                        i, j
                    )));
                }
            }
        }

        let covered = clipped.iter().fold(0u128, |acc, (s, t)| {
            acc + u128::from(s.len()) * u128::from(t.len())
        });
        let total = u128::from(source_count) * u128::from(target_count);
        if covered != total {
            return Err(ConnGenError::InvalidScheme(format!(
                "masks cover {} of {} links",
                covered, total
            )));
        }
        Ok(())
    }
}

impl From<Vec<Mask>> for PartitionScheme {
    fn from(masks: Vec<Mask>) -> Self {
        Self::new(masks)
    }
}

fn check_workers(workers: usize) -> ConnGenResult<()> {
    if workers == 0 {
        return Err(ConnGenError::InvalidScheme(
            "at least one partition is required".to_string(),
        ));
    }
    Ok(())
}

/// `[0, count)` as an interval set
fn span(count: Index) -> IntervalSet {
    if count == 0 {
        IntervalSet::empty()
    } else {
        IntervalSet::from(0..=count - 1)
    }
}

/// Split `[0, count)` into `parts` contiguous blocks; trailing blocks may be empty
fn split(count: Index, parts: usize) -> Vec<IntervalSet> {
    let parts_n = parts as Index;
    let base = count / parts_n;
    let extra = count % parts_n;
    let mut next = 0;
    (0..parts_n)
        .map(|p| {
            let size = base + Index::from(p < extra);
            let block = if size == 0 {
                IntervalSet::empty()
            } else {
                IntervalSet::from(next..=next + size - 1)
            };
            next += size;
            block
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_robin_is_partition() {
        let scheme = PartitionScheme::round_robin(4, 10, 5).unwrap();
        assert_eq!(scheme.len(), 4);
        assert_eq!(
            scheme.mask(1).unwrap().sources.iter().collect::<Vec<_>>(),
            vec![1, 5, 9]
        );
        scheme.verify(10, 5).unwrap();
    }

    #[test]
    fn test_more_workers_than_sources() {
        let scheme = PartitionScheme::round_robin(5, 3, 2).unwrap();
        assert!(scheme.mask(4).unwrap().is_empty());
        scheme.verify(3, 2).unwrap();
    }

    #[test]
    fn test_blocks_and_grid() {
        let blocks = PartitionScheme::blocks(3, 10, 4).unwrap();
        let sizes: Vec<Index> = blocks.masks().iter().map(|m| m.sources.len()).collect();
        assert_eq!(sizes, vec![4, 3, 3]);
        blocks.verify(10, 4).unwrap();

        let grid = PartitionScheme::grid(2, 2, 100, 100).unwrap();
        assert_eq!(grid.len(), 4);
        assert_eq!(grid.owner(75, 10), Some(2));
        grid.verify(100, 100).unwrap();
    }

    #[test]
    fn test_verify_detects_overlap_and_gaps() {
        let overlapping = PartitionScheme::new(vec![
            Mask::new(IntervalSet::from(0..=5), IntervalSet::from(0..=9)),
            Mask::new(IntervalSet::from(5..=9), IntervalSet::from(0..=9)),
        ]);
        assert!(matches!(
            overlapping.verify(10, 10),
            Err(ConnGenError::InvalidScheme(_))
        ));

        let gappy = PartitionScheme::new(vec![Mask::new(
            IntervalSet::from(0..=4),
            IntervalSet::from(0..=9),
        )]);
        assert!(matches!(
            gappy.verify(10, 10),
            Err(ConnGenError::InvalidScheme(_))
        ));
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(PartitionScheme::round_robin(0, 10, 10).is_err());
        assert_eq!(
            PartitionScheme::blocks(2, 4, 4).unwrap().mask(2),
            Err(ConnGenError::InvalidPartition { local: 2, count: 2 })
        );
    }
}
