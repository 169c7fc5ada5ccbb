// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Connection generator - the pull-based iteration protocol.

## Lifecycle

```text
            set_masks()              start()            next() = None
  (any) ───────────────► view ready ────────► Iterating ──────────────► Exhausted
                                                 ▲                         │
                                                 └──────── start() ────────┘
```

- `start()` fails with `Uninitialized` until a partitioned view is installed
  by `set_masks()` (use [`Mask::full`] for the unrestricted sequence).
- `next_*()` fails with `NotStarted` before `start()`, after the sequence
  ends, and after `set_masks()` invalidated the cursor.
- An engine fault or a non-float payload ends the pass. The error is returned
  from that `next_*()` call and kept in [`ConnectionGenerator::last_fault`], so
  a caller can tell "ran out of links" from "engine failed mid-stream".

One generator must be driven from one thread at a time; separate generators
can run on separate threads because every engine call is serialized by the
global provider lock.
*/

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::error::{ConnGenError, ConnGenResult};
use crate::handle::{ProviderCursor, ProviderHandle};
use crate::interval::Index;
use crate::link::{Link, RawLink};
use crate::mask::{CrossMask, Mask};
use crate::provider::{partition_view, ConnectionSet};

/// Iteration state of a generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationState {
    Unstarted,
    Iterating,
    Exhausted,
}

/// Adapter turning an engine connection set into a restartable link stream
pub struct ConnectionGenerator {
    /// Unrestricted engine object
    base: ProviderHandle,
    /// Restriction installed by the last successful `set_masks()`
    view: Option<ProviderHandle>,
    /// Current pass over `view`
    cursor: Option<ProviderCursor>,
    state: IterationState,
    arity: usize,
    last_fault: Option<ConnGenError>,
}

impl ConnectionGenerator {
    /// Adopt an engine object; arity is read once and fixed from here on
    pub fn new(base: ProviderHandle) -> Self {
        let arity = base.with(|set| set.arity());
        Self {
            base,
            view: None,
            cursor: None,
            state: IterationState::Unstarted,
            arity,
            last_fault: None,
        }
    }

    pub fn from_set(set: Arc<dyn ConnectionSet>) -> Self {
        Self::new(ProviderHandle::adopt(set))
    }

    /// Number of values carried per link
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Link count of the unrestricted base set (not the partitioned view)
    pub fn size(&self) -> ConnGenResult<u64> {
        self.base.with(|set| set.size())
    }

    pub fn state(&self) -> IterationState {
        self.state
    }

    /// Error that terminated the previous pass; `None` after natural exhaustion
    pub fn last_fault(&self) -> Option<&ConnGenError> {
        self.last_fault.as_ref()
    }

    /// True once a partitioned view is installed and `start()` may succeed
    pub fn is_ready(&self) -> bool {
        self.view.is_some()
    }

    pub fn base(&self) -> &ProviderHandle {
        &self.base
    }

    /// Restrict to the single mask `mask`
    pub fn set_mask(&mut self, mask: &Mask) -> ConnGenResult<()> {
        self.set_masks(std::slice::from_ref(mask), 0)
    }

    /// Restrict to the links of partition `local` of `masks`
    ///
    /// Replaces any previous restriction and invalidates the current cursor.
    /// On failure no view remains installed and `start()` is rejected until a
    /// later call succeeds.
    pub fn set_masks(&mut self, masks: &[Mask], local: usize) -> ConnGenResult<()> {
        self.cursor = None;
        self.view = None;

        if local >= masks.len() {
            return Err(ConnGenError::InvalidPartition {
                local,
                count: masks.len(),
            });
        }
        let crosses: Vec<CrossMask> = masks.iter().map(Mask::cross).collect();

        match self.base.with(|set| partition_view(set, &crosses, local)) {
            Ok(view) => {
                debug!(
                    "Installed partition {} of {} (arity {})",
                    local,
                    masks.len(),
                    self.arity
                );
                self.view = Some(ProviderHandle::adopt(view));
                Ok(())
            }
            Err(e) => {
                warn!("Failed to create masked connection set: {}", e);
                Err(e)
            }
        }
    }

    /// Rewind to the beginning of the partitioned sequence
    ///
    /// Safe to call repeatedly; each call discards the previous position.
    pub fn start(&mut self) -> ConnGenResult<()> {
        let view = self.view.as_ref().ok_or(ConnGenError::Uninitialized)?;
        self.cursor = None;
        self.last_fault = None;
        match ProviderCursor::open(view) {
            Ok(cursor) => {
                trace!("Iteration pass started");
                self.cursor = Some(cursor);
                self.state = IterationState::Iterating;
                Ok(())
            }
            Err(e) => {
                warn!("Provider failed to start iteration: {}", e);
                self.finish(Some(e.clone()));
                Err(e)
            }
        }
    }

    /// Advance, writing the payload into `values` (length must equal arity)
    ///
    /// Returns the `(source, target)` pair, or `None` at end of sequence.
    /// `values` is only written when a link is returned.
    pub fn next_into(&mut self, values: &mut [f64]) -> ConnGenResult<Option<(Index, Index)>> {
        if self.cursor.is_none() {
            return Err(ConnGenError::NotStarted);
        }
        if values.len() != self.arity {
            return Err(ConnGenError::BufferSize {
                expected: self.arity,
                actual: values.len(),
            });
        }
        let Some(raw) = self.advance_raw()? else {
            return Ok(None);
        };
        match raw.write_values(values) {
            Ok(()) => Ok(Some((raw.source, raw.target))),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Advance, returning an owned link or `None` at end of sequence
    pub fn next_link(&mut self) -> ConnGenResult<Option<Link>> {
        let Some(raw) = self.advance_raw()? else {
            return Ok(None);
        };
        match Link::from_raw(&raw, self.arity) {
            Ok(link) => Ok(Some(link)),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Start a pass and iterate it; the iterator stops after the first error
    pub fn links(&mut self) -> ConnGenResult<Links<'_>> {
        self.start()?;
        Ok(Links {
            generator: self,
            done: false,
        })
    }

    /// Count the links of the partitioned view by running a full pass
    ///
    /// Payloads are checked as in [`Self::next_link`], so a pass that would
    /// end in `TypeMismatch` fails here too. Leaves the generator exhausted.
    pub fn count_partitioned(&mut self) -> ConnGenResult<u64> {
        self.start()?;
        let mut n = 0;
        while self.next_link()?.is_some() {
            n += 1;
        }
        Ok(n)
    }

    fn advance_raw(&mut self) -> ConnGenResult<Option<RawLink>> {
        let cursor = self.cursor.as_mut().ok_or(ConnGenError::NotStarted)?;
        match cursor.advance() {
            None => {
                trace!("Iteration pass exhausted");
                self.finish(None);
                Ok(None)
            }
            Some(Ok(raw)) => Ok(Some(raw)),
            Some(Err(e)) => Err(self.fail(e)),
        }
    }

    fn fail(&mut self, e: ConnGenError) -> ConnGenError {
        warn!("Iteration terminated: {}", e);
        self.finish(Some(e.clone()));
        e
    }

    fn finish(&mut self, fault: Option<ConnGenError>) {
        self.cursor = None;
        self.state = IterationState::Exhausted;
        self.last_fault = fault;
    }
}

impl fmt::Debug for ConnectionGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionGenerator")
            .field("arity", &self.arity)
            .field("state", &self.state)
            .field("ready", &self.view.is_some())
            .field("last_fault", &self.last_fault)
            .finish()
    }
}

/// Borrowing iterator over one pass of a generator
pub struct Links<'a> {
    generator: &'a mut ConnectionGenerator,
    done: bool,
}

impl Iterator for Links<'_> {
    type Item = ConnGenResult<Link>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.generator.next_link() {
            Ok(Some(link)) => Some(Ok(link)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::IntervalSet;
    use crate::link::PayloadValue;
    use crate::provider::LinkCursor;
    use std::any::Any;

    /// Engine stand-in: a fixed list of links, optionally failing at a position
    #[derive(Debug)]
    struct Script {
        arity: usize,
        links: Vec<RawLink>,
        fail_at: Option<usize>,
        broken: Option<Broken>,
    }

    /// Engine entry point that reports an error instead of answering
    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Broken {
        Partition,
        Cursor,
    }

    struct ScriptCursor {
        links: Vec<RawLink>,
        pos: usize,
        fail_at: Option<usize>,
    }

    impl LinkCursor for ScriptCursor {
        fn advance(&mut self) -> Option<ConnGenResult<RawLink>> {
            if self.fail_at == Some(self.pos) {
                self.pos += 1;
                return Some(Err(ConnGenError::Provider("engine raised".into())));
            }
            let link = self.links.get(self.pos).cloned();
            self.pos += 1;
            link.map(Ok)
        }
    }

    impl ConnectionSet for Script {
        fn arity(&self) -> usize {
            self.arity
        }
        fn size(&self) -> ConnGenResult<u64> {
            Ok(self.links.len() as u64)
        }
        fn cursor(&self) -> ConnGenResult<Box<dyn LinkCursor>> {
            if self.broken == Some(Broken::Cursor) {
                return Err(ConnGenError::Provider("no iterator".into()));
            }
            Ok(Box::new(ScriptCursor {
                links: self.links.clone(),
                pos: 0,
                fail_at: self.fail_at,
            }))
        }
        fn partition(
            &self,
            _masks: &[CrossMask],
            _local: usize,
        ) -> ConnGenResult<Option<Arc<dyn ConnectionSet>>> {
            if self.broken == Some(Broken::Partition) {
                return Err(ConnGenError::Provider("bad mask".into()));
            }
            Ok(None)
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn six_links() -> Vec<RawLink> {
        vec![
            RawLink::numeric(0, 0, &[0.1]),
            RawLink::numeric(0, 1, &[0.2]),
            RawLink::numeric(1, 0, &[0.3]),
            RawLink::numeric(1, 1, &[0.4]),
            RawLink::numeric(2, 0, &[0.5]),
            RawLink::numeric(2, 1, &[0.6]),
        ]
    }

    fn generator(links: Vec<RawLink>, arity: usize, fail_at: Option<usize>) -> ConnectionGenerator {
        ConnectionGenerator::new(ProviderHandle::new(Script {
            arity,
            links,
            fail_at,
            broken: None,
        }))
    }

    fn broken_generator(broken: Broken) -> ConnectionGenerator {
        ConnectionGenerator::new(ProviderHandle::new(Script {
            arity: 1,
            links: six_links(),
            fail_at: None,
            broken: Some(broken),
        }))
    }

    fn drain(gen: &mut ConnectionGenerator) -> Vec<Link> {
        let mut out = Vec::new();
        while let Some(link) = gen.next_link().unwrap() {
            out.push(link);
        }
        out
    }

    #[test]
    fn test_start_requires_view() {
        let mut gen = generator(six_links(), 1, None);
        assert_eq!(gen.start(), Err(ConnGenError::Uninitialized));
        assert_eq!(gen.state(), IterationState::Unstarted);
    }

    #[test]
    fn test_next_before_start() {
        let mut gen = generator(six_links(), 1, None);
        gen.set_mask(&Mask::full()).unwrap();
        assert_eq!(gen.next_link(), Err(ConnGenError::NotStarted));
        let mut values = [0.0];
        assert_eq!(gen.next_into(&mut values), Err(ConnGenError::NotStarted));
    }

    #[test]
    fn test_mask_scenario() {
        let mut gen = generator(six_links(), 1, None);
        let mask = Mask::new(IntervalSet::from(0..=1), IntervalSet::from(0..=1));
        gen.set_masks(&[mask], 0).unwrap();
        gen.start().unwrap();
        let links = drain(&mut gen);
        assert_eq!(
            links,
            vec![
                Link::new(0, 0, vec![0.1]),
                Link::new(0, 1, vec![0.2]),
                Link::new(1, 0, vec![0.3]),
                Link::new(1, 1, vec![0.4]),
            ]
        );
        assert_eq!(gen.size().unwrap(), 6);
    }

    #[test]
    fn test_exhaustion_is_sticky() {
        let mut gen = generator(six_links(), 1, None);
        gen.set_mask(&Mask::full()).unwrap();
        gen.start().unwrap();
        assert_eq!(drain(&mut gen).len(), 6);
        assert_eq!(gen.state(), IterationState::Exhausted);
        assert!(gen.last_fault().is_none());
        assert_eq!(gen.next_link(), Err(ConnGenError::NotStarted));

        gen.start().unwrap();
        assert_eq!(gen.state(), IterationState::Iterating);
        assert_eq!(drain(&mut gen).len(), 6);
    }

    #[test]
    fn test_double_start_matches_single_start() {
        let mut gen = generator(six_links(), 1, None);
        gen.set_mask(&Mask::full()).unwrap();
        gen.start().unwrap();
        let once = drain(&mut gen);

        gen.start().unwrap();
        gen.next_link().unwrap();
        gen.start().unwrap();
        gen.start().unwrap();
        assert_eq!(drain(&mut gen), once);
    }

    #[test]
    fn test_next_into_out_parameters() {
        let mut gen = generator(six_links(), 1, None);
        gen.set_mask(&Mask::full()).unwrap();
        gen.start().unwrap();
        let mut values = [0.0];
        assert_eq!(gen.next_into(&mut values).unwrap(), Some((0, 0)));
        assert_eq!(values, [0.1]);

        let mut wrong = [0.0, 0.0];
        assert_eq!(
            gen.next_into(&mut wrong),
            Err(ConnGenError::BufferSize {
                expected: 1,
                actual: 2
            })
        );
        // A sizing error does not consume a link
        assert_eq!(gen.next_into(&mut values).unwrap(), Some((0, 1)));
    }

    #[test]
    fn test_type_mismatch_ends_pass() {
        let links = vec![
            RawLink::numeric(0, 0, &[1.0, 2.0]),
            RawLink::new(
                0,
                1,
                vec![PayloadValue::Float(1.0), PayloadValue::Text("w".into())],
            ),
            RawLink::numeric(0, 2, &[1.0, 2.0]),
        ];
        let mut gen = generator(links, 2, None);
        gen.set_mask(&Mask::full()).unwrap();
        gen.start().unwrap();

        let mut values = [0.0; 2];
        assert_eq!(gen.next_into(&mut values).unwrap(), Some((0, 0)));
        assert_eq!(values, [1.0, 2.0]);

        let mut scratch = [-1.0; 2];
        assert!(matches!(
            gen.next_into(&mut scratch),
            Err(ConnGenError::TypeMismatch { slot: 1, .. })
        ));
        assert_eq!(scratch, [-1.0; 2]);
        assert_eq!(gen.state(), IterationState::Exhausted);
        assert!(matches!(
            gen.last_fault(),
            Some(ConnGenError::TypeMismatch { .. })
        ));
        assert_eq!(gen.next_into(&mut scratch), Err(ConnGenError::NotStarted));
    }

    #[test]
    fn test_provider_fault_is_distinguishable() {
        let mut gen = generator(six_links(), 1, Some(2));
        gen.set_mask(&Mask::full()).unwrap();
        gen.start().unwrap();
        assert!(gen.next_link().unwrap().is_some());
        assert!(gen.next_link().unwrap().is_some());
        assert_eq!(
            gen.next_link(),
            Err(ConnGenError::Provider("engine raised".into()))
        );
        assert_eq!(gen.state(), IterationState::Exhausted);
        assert_eq!(
            gen.last_fault(),
            Some(&ConnGenError::Provider("engine raised".into()))
        );

        // A fresh pass clears the recorded fault
        gen.start().unwrap();
        assert!(gen.last_fault().is_none());
    }

    #[test]
    fn test_set_masks_invalidates_cursor() {
        let mut gen = generator(six_links(), 1, None);
        gen.set_mask(&Mask::full()).unwrap();
        gen.start().unwrap();
        gen.next_link().unwrap();

        let sources_two = Mask::new(IntervalSet::from(2..=2), IntervalSet::from(0..=9));
        gen.set_mask(&sources_two).unwrap();
        assert_eq!(gen.next_link(), Err(ConnGenError::NotStarted));

        gen.start().unwrap();
        let links = drain(&mut gen);
        assert!(links.iter().all(|l| l.source == 2));
        assert_eq!(links.len(), 2);
    }

    #[test]
    fn test_failed_restriction_blocks_start() {
        let mut gen = generator(six_links(), 1, None);
        gen.set_mask(&Mask::full()).unwrap();
        assert_eq!(
            gen.set_masks(&[Mask::full()], 3),
            Err(ConnGenError::InvalidPartition { local: 3, count: 1 })
        );
        assert!(!gen.is_ready());
        assert_eq!(gen.start(), Err(ConnGenError::Uninitialized));
    }

    #[test]
    fn test_engine_partition_error_blocks_start() {
        let mut gen = broken_generator(Broken::Partition);
        assert_eq!(
            gen.set_mask(&Mask::full()),
            Err(ConnGenError::Provider("bad mask".into()))
        );
        assert!(!gen.is_ready());
        assert_eq!(gen.start(), Err(ConnGenError::Uninitialized));
        assert_eq!(gen.state(), IterationState::Unstarted);
    }

    #[test]
    fn test_engine_cursor_error_fails_start() {
        let mut gen = broken_generator(Broken::Cursor);
        gen.set_mask(&Mask::full()).unwrap();
        assert_eq!(
            gen.start(),
            Err(ConnGenError::Provider("no iterator".into()))
        );
        assert_eq!(gen.state(), IterationState::Exhausted);
        assert_eq!(
            gen.last_fault(),
            Some(&ConnGenError::Provider("no iterator".into()))
        );
        assert_eq!(gen.next_link(), Err(ConnGenError::NotStarted));
    }

    #[test]
    fn test_count_checks_payloads() {
        let links = vec![
            RawLink::numeric(0, 0, &[1.0]),
            RawLink::new(0, 1, vec![PayloadValue::Text("w".into())]),
        ];
        let mut gen = generator(links, 1, None);
        gen.set_mask(&Mask::full()).unwrap();
        assert!(matches!(
            gen.count_partitioned(),
            Err(ConnGenError::TypeMismatch { slot: 0, .. })
        ));
        assert_eq!(gen.state(), IterationState::Exhausted);
    }

    #[test]
    fn test_links_iterator_and_count() {
        let mut gen = generator(six_links(), 1, None);
        let mask = Mask::new(IntervalSet::from(1..=2), IntervalSet::from(1..=1));
        gen.set_mask(&mask).unwrap();
        let sources: Vec<Index> = gen.links().unwrap().map(|l| l.unwrap().source).collect();
        assert_eq!(sources, vec![1, 2]);
        assert_eq!(gen.count_partitioned().unwrap(), 2);
        assert_eq!(gen.state(), IterationState::Exhausted);
    }

    #[test]
    fn test_links_iterator_stops_after_fault() {
        let mut gen = generator(six_links(), 1, Some(1));
        gen.set_mask(&Mask::full()).unwrap();
        let results: Vec<_> = gen.links().unwrap().collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }
}
