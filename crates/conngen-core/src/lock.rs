// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Process-wide provider lock.

Every call that touches a description engine runs inside this critical
section, so two threads never execute engine code at the same time. The lock
is reentrant: a thread already inside an engine call may drop handles or call
back into the engine without deadlocking.

Pure data-model work (interval expansion, mask construction) never takes it.
*/

use once_cell::sync::Lazy;
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

/// Global provider critical section
static PROVIDER_LOCK: Lazy<ReentrantMutex<()>> = Lazy::new(|| ReentrantMutex::new(()));

/// Guard held for the duration of one provider call
pub type ProviderGuard = ReentrantMutexGuard<'static, ()>;

/// Enter the provider critical section
pub fn acquire() -> ProviderGuard {
    PROVIDER_LOCK.lock()
}

/// Run `f` inside the provider critical section
pub fn with_provider<R>(f: impl FnOnce() -> R) -> R {
    let _guard = acquire();
    f()
}

/// True when the calling thread is inside the critical section
pub fn held_by_current_thread() -> bool {
    PROVIDER_LOCK.is_owned_by_current_thread()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_is_reentrant() {
        let outer = acquire();
        assert!(held_by_current_thread());
        let nested = with_provider(|| {
            let _inner = acquire();
            held_by_current_thread()
        });
        assert!(nested);
        drop(outer);
        assert!(!held_by_current_thread());
    }
}
