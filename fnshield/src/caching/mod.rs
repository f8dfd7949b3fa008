//! Result memoization.
//!
//! Two decorators share the same bounded FIFO cache:
//! - [`StickyFunc`] caches without coordinating concurrent misses. Two
//!   threads missing the same input may both compute; the last write wins.
//! - [`SolidFunc`] additionally guarantees the wrapped function runs at
//!   most once per missing input, however many threads ask for it.
//!
//! Eviction is by insertion order, never by access.

mod fifo;
mod solid;
mod sticky;

pub use fifo::FifoCache;
pub use solid::SolidFunc;
pub use sticky::StickyFunc;
