// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Elementary connection sets over finite index domains.

| Set | Links | Order |
|-----|-------|-------|
| [`OneToOne`] | `(i, i)` for each `i` in the domain | ascending `i` |
| [`AllToAll`] | every `(s, t)` in `sources × targets` | target-major: for each target, sources ascending |

Both restrict themselves natively: partitioning intersects the domains with
the selected mask instead of filtering a full pass.
*/

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use conngen_core::{
    ClosedRange, ConnGenError, ConnGenResult, ConnectionSet, CrossMask, Index, IntervalSet,
    LinkCursor, PayloadValue, RawLink,
};
use tracing::debug;

/// Per-link value attached to an elementary set
#[derive(Clone)]
pub enum ValueSet {
    Constant(f64),
    /// Value computed from `(source, target)`
    Function(Arc<dyn Fn(Index, Index) -> f64 + Send + Sync>),
}

impl ValueSet {
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(Index, Index) -> f64 + Send + Sync + 'static,
    {
        ValueSet::Function(Arc::new(f))
    }

    pub fn value(&self, source: Index, target: Index) -> f64 {
        match self {
            ValueSet::Constant(v) => *v,
            ValueSet::Function(f) => f(source, target),
        }
    }
}

impl fmt::Debug for ValueSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSet::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            ValueSet::Function(_) => f.write_str("Function(..)"),
        }
    }
}

impl From<f64> for ValueSet {
    fn from(v: f64) -> Self {
        ValueSet::Constant(v)
    }
}

/// Diagonal links `(i, i)` over a finite domain
#[derive(Debug, Clone)]
pub struct OneToOne {
    domain: IntervalSet,
    values: Arc<Vec<ValueSet>>,
}

impl OneToOne {
    pub fn new(domain: IntervalSet, values: Vec<ValueSet>) -> Self {
        Self {
            domain,
            values: Arc::new(values),
        }
    }

    pub fn domain(&self) -> &IntervalSet {
        &self.domain
    }
}

impl ConnectionSet for OneToOne {
    fn arity(&self) -> usize {
        self.values.len()
    }

    fn size(&self) -> ConnGenResult<u64> {
        Ok(self.domain.len())
    }

    fn cursor(&self) -> ConnGenResult<Box<dyn LinkCursor>> {
        let pairs = members(Arc::new(self.domain.expand())).map(|i| (i, i));
        Ok(Box::new(ValueCursor::new(pairs, Arc::clone(&self.values))))
    }

    fn partition(
        &self,
        masks: &[CrossMask],
        local: usize,
    ) -> ConnGenResult<Option<Arc<dyn ConnectionSet>>> {
        let mask = select(masks, local)?;
        let domain = self
            .domain
            .intersection(&mask.source_set()?)
            .intersection(&mask.target_set()?);
        debug!(
            "One-to-one partition {}: {} of {} links",
            local,
            domain.len(),
            self.domain.len()
        );
        Ok(Some(Arc::new(Self {
            domain,
            values: Arc::clone(&self.values),
        })))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Every `(source, target)` pair of two finite domains
#[derive(Debug, Clone)]
pub struct AllToAll {
    sources: IntervalSet,
    targets: IntervalSet,
    values: Arc<Vec<ValueSet>>,
}

impl AllToAll {
    pub fn new(sources: IntervalSet, targets: IntervalSet, values: Vec<ValueSet>) -> Self {
        Self {
            sources,
            targets,
            values: Arc::new(values),
        }
    }

    pub fn sources(&self) -> &IntervalSet {
        &self.sources
    }

    pub fn targets(&self) -> &IntervalSet {
        &self.targets
    }
}

impl ConnectionSet for AllToAll {
    fn arity(&self) -> usize {
        self.values.len()
    }

    fn size(&self) -> ConnGenResult<u64> {
        Ok(self.sources.len().saturating_mul(self.targets.len()))
    }

    fn cursor(&self) -> ConnGenResult<Box<dyn LinkCursor>> {
        let sources = Arc::new(self.sources.expand());
        let pairs = members(Arc::new(self.targets.expand()))
            .flat_map(move |t| members(Arc::clone(&sources)).map(move |s| (s, t)));
        Ok(Box::new(ValueCursor::new(pairs, Arc::clone(&self.values))))
    }

    fn partition(
        &self,
        masks: &[CrossMask],
        local: usize,
    ) -> ConnGenResult<Option<Arc<dyn ConnectionSet>>> {
        let mask = select(masks, local)?;
        let sources = self.sources.intersection(&mask.source_set()?);
        let targets = self.targets.intersection(&mask.target_set()?);
        debug!(
            "All-to-all partition {}: {} sources x {} targets",
            local,
            sources.len(),
            targets.len()
        );
        Ok(Some(Arc::new(Self {
            sources,
            targets,
            values: Arc::clone(&self.values),
        })))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn select(masks: &[CrossMask], local: usize) -> ConnGenResult<&CrossMask> {
    masks.get(local).ok_or(ConnGenError::InvalidPartition {
        local,
        count: masks.len(),
    })
}

/// Members of expanded unit-stride ranges, ascending
fn members(ranges: Arc<Vec<ClosedRange>>) -> impl Iterator<Item = Index> + Send {
    (0..ranges.len()).flat_map(move |i| {
        let r = ranges[i];
        r.first..=r.last
    })
}

/// Attaches value-set payloads to a stream of index pairs
struct ValueCursor<I> {
    pairs: I,
    values: Arc<Vec<ValueSet>>,
}

impl<I> ValueCursor<I> {
    fn new(pairs: I, values: Arc<Vec<ValueSet>>) -> Self {
        Self { pairs, values }
    }
}

impl<I> LinkCursor for ValueCursor<I>
where
    I: Iterator<Item = (Index, Index)> + Send,
{
    fn advance(&mut self) -> Option<ConnGenResult<RawLink>> {
        let (s, t) = self.pairs.next()?;
        let values = self
            .values
            .iter()
            .map(|v| PayloadValue::Float(v.value(s, t)))
            .collect();
        Some(Ok(RawLink::new(s, t, values)))
    }
}
