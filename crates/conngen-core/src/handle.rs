// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Reference-counted handles to engine objects.

Engine objects are shared through `Arc`, but every reference count change
and every call happens inside the provider critical section: adoption,
cloning and release all take the global lock, as does every call made
through [`ProviderHandle::with`] and [`ProviderCursor::advance`].
*/

use std::fmt;
use std::sync::Arc;

use crate::error::ConnGenResult;
use crate::link::RawLink;
use crate::lock;
use crate::provider::{ConnectionSet, LinkCursor};

/// Owning reference to an engine connection set
pub struct ProviderHandle {
    // Only `None` while being released in `Drop`
    set: Option<Arc<dyn ConnectionSet>>,
}

impl ProviderHandle {
    /// Take a reference to an engine object
    pub fn adopt(set: Arc<dyn ConnectionSet>) -> Self {
        let _guard = lock::acquire();
        Self { set: Some(set) }
    }

    /// Wrap a freshly built engine object
    pub fn new<S: ConnectionSet + 'static>(set: S) -> Self {
        Self::adopt(Arc::new(set))
    }

    /// Call into the engine object inside the provider critical section
    pub fn with<R>(&self, f: impl FnOnce(&Arc<dyn ConnectionSet>) -> R) -> R {
        let _guard = lock::acquire();
        f(self.set())
    }

    /// Number of live references to the engine object
    pub fn ref_count(&self) -> usize {
        let _guard = lock::acquire();
        Arc::strong_count(self.set())
    }

    /// Same engine object behind both handles
    pub fn ptr_eq(&self, other: &ProviderHandle) -> bool {
        Arc::ptr_eq(self.set(), other.set())
    }

    fn set(&self) -> &Arc<dyn ConnectionSet> {
        match &self.set {
            Some(set) => set,
            None => unreachable!("provider handle used after release"),
        }
    }
}

impl Clone for ProviderHandle {
    fn clone(&self) -> Self {
        let _guard = lock::acquire();
        Self {
            set: Some(Arc::clone(self.set())),
        }
    }
}

impl Drop for ProviderHandle {
    fn drop(&mut self) {
        let _guard = lock::acquire();
        self.set.take();
    }
}

impl fmt::Debug for ProviderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ProviderHandle").field(&self.set).finish()
    }
}

/// Owning wrapper around one engine iteration pass
pub struct ProviderCursor {
    inner: Option<Box<dyn LinkCursor>>,
}

impl ProviderCursor {
    /// Open a new pass over `set`
    pub fn open(set: &ProviderHandle) -> ConnGenResult<Self> {
        let inner = set.with(|s| s.cursor())?;
        Ok(Self { inner: Some(inner) })
    }

    pub fn advance(&mut self) -> Option<ConnGenResult<RawLink>> {
        let _guard = lock::acquire();
        self.inner.as_mut()?.advance()
    }
}

impl Drop for ProviderCursor {
    fn drop(&mut self) {
        let _guard = lock::acquire();
        self.inner.take();
    }
}

impl fmt::Debug for ProviderCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCursor")
            .field("open", &self.inner.is_some())
            .finish()
    }
}
