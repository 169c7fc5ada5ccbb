// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Explicit connection sets - a finite list of links held in memory.
*/

use std::any::Any;
use std::sync::Arc;

use conngen_core::{ConnGenError, ConnGenResult, ConnectionSet, LinkCursor, RawLink};

/// Fixed list of links with a common arity
///
/// Links keep their engine-native payload; non-float values surface as
/// `TypeMismatch` only when a generator reads them.
#[derive(Debug, Clone)]
pub struct ExplicitSet {
    arity: usize,
    links: Arc<Vec<RawLink>>,
}

impl ExplicitSet {
    /// # Errors
    /// `Provider` if a link carries a payload of the wrong length.
    pub fn new(arity: usize, links: Vec<RawLink>) -> ConnGenResult<Self> {
        if let Some((i, bad)) = links
            .iter()
            .enumerate()
            .find(|(_, l)| l.values.len() != arity)
        {
            return Err(ConnGenError::Provider(format!(
                "link {} ({}, {}) carries {} values, expected {}",
                i,
                bad.source,
                bad.target,
                bad.values.len(),
                arity
            )));
        }
        Ok(Self {
            arity,
            links: Arc::new(links),
        })
    }

    /// Links with all-float payloads
    pub fn numeric<I>(arity: usize, links: I) -> ConnGenResult<Self>
    where
        I: IntoIterator<Item = (u64, u64, Vec<f64>)>,
    {
        let links = links
            .into_iter()
            .map(|(s, t, v)| RawLink::numeric(s, t, &v))
            .collect();
        Self::new(arity, links)
    }

    pub fn links(&self) -> &[RawLink] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl ConnectionSet for ExplicitSet {
    fn arity(&self) -> usize {
        self.arity
    }

    fn size(&self) -> ConnGenResult<u64> {
        Ok(self.links.len() as u64)
    }

    fn cursor(&self) -> ConnGenResult<Box<dyn LinkCursor>> {
        Ok(Box::new(ExplicitCursor {
            links: Arc::clone(&self.links),
            pos: 0,
        }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct ExplicitCursor {
    links: Arc<Vec<RawLink>>,
    pos: usize,
}

impl LinkCursor for ExplicitCursor {
    fn advance(&mut self) -> Option<ConnGenResult<RawLink>> {
        let link = self.links.get(self.pos)?.clone();
        self.pos += 1;
        Some(Ok(link))
    }
}
