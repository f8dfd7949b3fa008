//! Memoizing decorator without miss coordination.

use super::FifoCache;
use crate::errors::Result;
use crate::func::Func;
use parking_lot::RwLock;
use std::hash::Hash;
use tracing::{debug, trace};

/// Caches successful results of the wrapped function.
///
/// Concurrent misses on the same input may each invoke the wrapped function;
/// the cache keeps whichever result was stored last. Failures are never
/// cached. Use [`SolidFunc`](super::SolidFunc) when the wrapped function
/// must run at most once per input.
pub struct StickyFunc<F, X, Y> {
    func: F,
    cache: RwLock<FifoCache<X, Y>>,
}

impl<F, X, Y> StickyFunc<F, X, Y>
where
    X: Eq + Hash + Clone,
{
    /// Creates an unbounded cache around `func`.
    pub fn new(func: F) -> Self {
        Self {
            func,
            cache: RwLock::new(FifoCache::unbounded()),
        }
    }

    /// Creates a cache around `func` holding at most `capacity` results.
    pub fn with_capacity(func: F, capacity: usize) -> Self {
        Self {
            func,
            cache: RwLock::new(FifoCache::bounded(capacity)),
        }
    }

    /// Returns the number of cached results.
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    /// Returns the capacity bound, `None` when unbounded.
    pub fn capacity(&self) -> Option<usize> {
        self.cache.read().capacity()
    }

    /// Returns true if a result for `input` is cached.
    pub fn contains(&self, input: &X) -> bool {
        self.cache.read().contains(input)
    }

    /// Drops every cached result.
    pub fn clear(&self) {
        self.cache.write().clear();
    }
}

impl<F, X, Y> Func<X, Y> for StickyFunc<F, X, Y>
where
    F: Func<X, Y>,
    X: Eq + Hash + Clone + Send + Sync,
    Y: Clone + Send + Sync,
{
    fn apply(&self, input: X) -> Result<Y> {
        let cached = self.cache.read().get(&input).cloned();
        if let Some(output) = cached {
            trace!("Sticky cache hit");
            return Ok(output);
        }

        debug!("Sticky cache miss");
        let output = self.func.apply(input.clone())?;

        let mut cache = self.cache.write();
        if cache.insert(input, output.clone()).is_some() {
            debug!(len = cache.len(), "Sticky cache evicted oldest entry");
        }
        Ok(output)
    }
}

impl<F, X, Y> std::fmt::Debug for StickyFunc<F, X, Y>
where
    X: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StickyFunc")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}
