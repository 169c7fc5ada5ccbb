// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Engine-facing traits.

A description engine exposes its connection sets through [`ConnectionSet`]
and each iteration pass through a [`LinkCursor`]. The adapter calls these
only while holding the global provider lock.

Engines without native partitioning return `Ok(None)` from
[`ConnectionSet::partition`]; [`partition_view`] then installs a
[`MaskedSet`] that filters the base set's links through the selected mask.
*/

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::{ConnGenError, ConnGenResult};
use crate::link::RawLink;
use crate::mask::CrossMask;

/// One iteration pass over a connection set
pub trait LinkCursor: Send {
    /// Next link, `None` at end of sequence, `Some(Err)` on an engine fault
    fn advance(&mut self) -> Option<ConnGenResult<RawLink>>;
}

/// Engine-native connection set
pub trait ConnectionSet: Send + Sync + fmt::Debug {
    /// Number of values carried per link
    fn arity(&self) -> usize;

    /// Number of links in this set; may be expensive
    fn size(&self) -> ConnGenResult<u64>;

    /// Begin a new iteration pass
    fn cursor(&self) -> ConnGenResult<Box<dyn LinkCursor>>;

    /// Restrict to partition `local` of `masks`, if the engine can do so natively
    fn partition(
        &self,
        _masks: &[CrossMask],
        _local: usize,
    ) -> ConnGenResult<Option<Arc<dyn ConnectionSet>>> {
        Ok(None)
    }

    /// Access to the concrete type, for type probing
    fn as_any(&self) -> &dyn Any;
}

/// Build the partitioned view of `base` for partition `local`
///
/// # Errors
/// `InvalidPartition` for an empty mask list or an out-of-range `local`;
/// any error the engine reports while partitioning.
pub fn partition_view(
    base: &Arc<dyn ConnectionSet>,
    masks: &[CrossMask],
    local: usize,
) -> ConnGenResult<Arc<dyn ConnectionSet>> {
    if local >= masks.len() {
        return Err(ConnGenError::InvalidPartition {
            local,
            count: masks.len(),
        });
    }
    match base.partition(masks, local)? {
        Some(native) => Ok(native),
        None => Ok(Arc::new(MaskedSet::new(
            Arc::clone(base),
            masks[local].clone(),
        ))),
    }
}

/// Links of `base` whose `(source, target)` falls inside `mask`, in base order
#[derive(Debug)]
pub struct MaskedSet {
    base: Arc<dyn ConnectionSet>,
    mask: Arc<CrossMask>,
}

impl MaskedSet {
    pub fn new(base: Arc<dyn ConnectionSet>, mask: CrossMask) -> Self {
        Self {
            base,
            mask: Arc::new(mask),
        }
    }

    pub fn mask(&self) -> &CrossMask {
        &self.mask
    }
}

impl ConnectionSet for MaskedSet {
    fn arity(&self) -> usize {
        self.base.arity()
    }

    fn size(&self) -> ConnGenResult<u64> {
        let mut cursor = self.cursor()?;
        let mut n = 0;
        while let Some(link) = cursor.advance() {
            link?;
            n += 1;
        }
        Ok(n)
    }

    fn cursor(&self) -> ConnGenResult<Box<dyn LinkCursor>> {
        Ok(Box::new(MaskedCursor {
            inner: self.base.cursor()?,
            mask: Arc::clone(&self.mask),
        }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct MaskedCursor {
    inner: Box<dyn LinkCursor>,
    mask: Arc<CrossMask>,
}

impl LinkCursor for MaskedCursor {
    fn advance(&mut self) -> Option<ConnGenResult<RawLink>> {
        loop {
            match self.inner.advance()? {
                Ok(link) if self.mask.contains(link.source, link.target) => {
                    return Some(Ok(link))
                }
                Ok(_) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::ClosedRange;

    #[derive(Debug)]
    struct Pairs(Vec<(u64, u64)>);

    struct PairsCursor(std::vec::IntoIter<(u64, u64)>);

    impl LinkCursor for PairsCursor {
        fn advance(&mut self) -> Option<ConnGenResult<RawLink>> {
            self.0.next().map(|(s, t)| Ok(RawLink::numeric(s, t, &[])))
        }
    }

    impl ConnectionSet for Pairs {
        fn arity(&self) -> usize {
            0
        }
        fn size(&self) -> ConnGenResult<u64> {
            Ok(self.0.len() as u64)
        }
        fn cursor(&self) -> ConnGenResult<Box<dyn LinkCursor>> {
            Ok(Box::new(PairsCursor(self.0.clone().into_iter())))
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn cross(s: (u64, u64), t: (u64, u64)) -> CrossMask {
        CrossMask {
            sources: vec![ClosedRange::from(s)],
            targets: vec![ClosedRange::from(t)],
        }
    }

    #[test]
    fn test_fallback_filters_in_base_order() {
        let base: Arc<dyn ConnectionSet> = Arc::new(Pairs(vec![(3, 0), (0, 1), (5, 5), (1, 0)]));
        let view = partition_view(&base, &[cross((0, 1), (0, 1)), cross((2, 9), (0, 9))], 0)
            .unwrap();
        let mut cursor = view.cursor().unwrap();
        let mut seen = Vec::new();
        while let Some(link) = cursor.advance() {
            let link = link.unwrap();
            seen.push((link.source, link.target));
        }
        assert_eq!(seen, vec![(0, 1), (1, 0)]);
        assert_eq!(view.size().unwrap(), 2);
    }

    #[test]
    fn test_partition_index_checked() {
        let base: Arc<dyn ConnectionSet> = Arc::new(Pairs(vec![]));
        assert_eq!(
            partition_view(&base, &[], 0).unwrap_err(),
            ConnGenError::InvalidPartition { local: 0, count: 0 }
        );
        assert_eq!(
            partition_view(&base, &[cross((0, 0), (0, 0))], 1).unwrap_err(),
            ConnGenError::InvalidPartition { local: 1, count: 1 }
        );
    }
}
