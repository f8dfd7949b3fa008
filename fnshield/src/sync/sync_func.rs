//! Mutually exclusive execution.

use super::SharedLock;
use crate::errors::Result;
use crate::func::Func;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::trace;

/// Runs the wrapped function while holding a lock.
///
/// All callers sharing the lock, through this decorator or by acquiring it
/// directly, are serialized. The lock is released on every exit path,
/// including failure and unwinding. Which waiter goes next is up to the
/// lock primitive.
pub struct SyncFunc<F, L = Arc<Mutex<()>>> {
    func: F,
    lock: L,
}

impl<F> SyncFunc<F, Arc<Mutex<()>>> {
    /// Serializes calls on a lock private to this decorator.
    ///
    /// The lock can still be shared afterwards through [`SyncFunc::lock`].
    pub fn new(func: F) -> Self {
        Self::with_lock(func, Arc::new(Mutex::new(())))
    }
}

impl<F, L> SyncFunc<F, L> {
    /// Serializes calls on a caller-supplied lock.
    pub const fn with_lock(func: F, lock: L) -> Self {
        Self { func, lock }
    }

    /// Returns the lock calls synchronize on.
    pub const fn lock(&self) -> &L {
        &self.lock
    }
}

impl<X, Y, F, L> Func<X, Y> for SyncFunc<F, L>
where
    F: Func<X, Y>,
    L: SharedLock,
{
    fn apply(&self, input: X) -> Result<Y> {
        let _guard = self.lock.acquire();
        trace!("Shared lock acquired");
        self.func.apply(input)
    }
}

impl<F, L> std::fmt::Debug for SyncFunc<F, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncFunc").finish_non_exhaustive()
    }
}
