//! Memoizing decorator with at-most-once evaluation per input.

use super::FifoCache;
use crate::errors::Result;
use crate::func::Func;
use dashmap::DashMap;
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::hash::Hash;
use std::sync::Arc;
use tracing::{debug, trace};

/// Per-input gate serializing callers that miss the same input.
type Gate = Arc<Mutex<()>>;

/// Caches successful results and runs the wrapped function at most once
/// per missing input.
///
/// Callers missing the same input queue behind a per-input gate; the first
/// one computes and the rest read its result from the cache. Callers for
/// different inputs do not block each other. If the computation fails,
/// nothing is cached and the next queued caller computes again.
///
/// The wrapped function must not re-enter the same `SolidFunc` with the
/// input it is computing; that deadlocks on the gate.
pub struct SolidFunc<F, X, Y>
where
    X: Eq + Hash,
{
    func: F,
    cache: RwLock<FifoCache<X, Y>>,
    inflight: DashMap<X, Gate>,
}

impl<F, X, Y> SolidFunc<F, X, Y>
where
    X: Eq + Hash + Clone,
{
    /// Creates an unbounded cache around `func`.
    pub fn new(func: F) -> Self {
        Self {
            func,
            cache: RwLock::new(FifoCache::unbounded()),
            inflight: DashMap::new(),
        }
    }

    /// Creates a cache around `func` holding at most `capacity` results.
    pub fn with_capacity(func: F, capacity: usize) -> Self {
        Self {
            func,
            cache: RwLock::new(FifoCache::bounded(capacity)),
            inflight: DashMap::new(),
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

    /// Returns the number of inputs currently being computed or awaited.
    pub fn in_flight(&self) -> usize {
        self.inflight.len()
    }

    /// Drops every cached result.
    pub fn clear(&self) {
        self.cache.write().clear();
    }
}

impl<F, X, Y> SolidFunc<F, X, Y>
where
    X: Eq + Hash + Clone,
    Y: Clone,
{
    fn cached(&self, input: &X) -> Option<Y> {
        self.cache.read().get(input).cloned()
    }
}

impl<F, X, Y> Func<X, Y> for SolidFunc<F, X, Y>
where
    F: Func<X, Y>,
    X: Eq + Hash + Clone + Send + Sync,
    Y: Clone + Send + Sync,
{
    fn apply(&self, input: X) -> Result<Y> {
        if let Some(output) = self.cached(&input) {
            trace!("Solid cache hit");
            return Ok(output);
        }

        let pass = InflightPass::enter(&self.inflight, input.clone());
        let _held = pass.hold();

        // Another caller may have filled the cache while we queued.
        if let Some(output) = self.cached(&input) {
            trace!("Solid cache hit after waiting");
            return Ok(output);
        }

        debug!("Solid cache miss");
        let output = self.func.apply(input.clone())?;

        let mut cache = self.cache.write();
        if cache.insert(input, output.clone()).is_some() {
            debug!(len = cache.len(), "Solid cache evicted oldest entry");
        }
        Ok(output)
    }
}

/// Holds a clone of an input's gate and retires it on drop.
///
/// Gates are cloned only under the map's shard lock. Once this pass has
/// released its own clone, a strong count of one (the map alone) means no
/// other caller is queued on the input.
struct InflightPass<'a, X>
where
    X: Eq + Hash,
{
    map: &'a DashMap<X, Gate>,
    key: X,
    gate: Option<Gate>,
}

impl<'a, X> InflightPass<'a, X>
where
    X: Eq + Hash + Clone,
{
    fn enter(map: &'a DashMap<X, Gate>, key: X) -> Self {
        let gate = map.entry(key.clone()).or_default().value().clone();
        Self {
            map,
            key,
            gate: Some(gate),
        }
    }

    /// Blocks until this pass owns the input's gate.
    fn hold(&self) -> Option<MutexGuard<'_, ()>> {
        self.gate.as_ref().map(|gate| gate.lock())
    }
}

impl<X> Drop for InflightPass<'_, X>
where
    X: Eq + Hash,
{
    fn drop(&mut self) {
        drop(self.gate.take());
        self.map
            .remove_if(&self.key, |_, current| Arc::strong_count(current) == 1);
    }
}

impl<F, X, Y> std::fmt::Debug for SolidFunc<F, X, Y>
where
    X: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolidFunc")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("in_flight", &self.in_flight())
            .finish_non_exhaustive()
    }
}
