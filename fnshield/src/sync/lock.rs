//! Lock primitives usable as a shared monitor.

use parking_lot::{
    Mutex, MutexGuard, ReentrantMutex, ReentrantMutexGuard, RwLock, RwLockWriteGuard,
};
use std::sync::Arc;

/// A lock that can be acquired exclusively, released when the guard drops.
///
/// Implemented for the `parking_lot` primitives and for references and
/// `Arc`s to them, so the caller keeps ownership of the lock while
/// decorators merely hold a handle.
pub trait SharedLock: Send + Sync {
    /// Held while the lock is acquired.
    type Guard<'a>
    where
        Self: 'a;

    /// Blocks until the lock is acquired.
    fn acquire(&self) -> Self::Guard<'_>;
}

impl<T> SharedLock for Mutex<T>
where
    T: Send,
{
    type Guard<'a> = MutexGuard<'a, T> where Self: 'a;

    fn acquire(&self) -> Self::Guard<'_> {
        self.lock()
    }
}

/// Re-entrant: a thread already holding the lock may acquire it again.
impl<T> SharedLock for ReentrantMutex<T>
where
    T: Send,
{
    type Guard<'a> = ReentrantMutexGuard<'a, T> where Self: 'a;

    fn acquire(&self) -> Self::Guard<'_> {
        self.lock()
    }
}

/// Acquires the write side.
impl<T> SharedLock for RwLock<T>
where
    T: Send + Sync,
{
    type Guard<'a> = RwLockWriteGuard<'a, T> where Self: 'a;

    fn acquire(&self) -> Self::Guard<'_> {
        self.write()
    }
}

impl<L> SharedLock for &L
where
    L: SharedLock + ?Sized,
{
    type Guard<'a> = L::Guard<'a> where Self: 'a;

    fn acquire(&self) -> Self::Guard<'_> {
        (**self).acquire()
    }
}

impl<L> SharedLock for Arc<L>
where
    L: SharedLock + ?Sized,
{
    type Guard<'a> = L::Guard<'a> where Self: 'a;

    fn acquire(&self) -> Self::Guard<'_> {
        (**self).acquire()
    }
}
