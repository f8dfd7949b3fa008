//! Mutual exclusion against a caller-owned lock.
//!
//! This module provides:
//! - SharedLock, the seam over lock primitives a caller may share
//! - SyncFunc, running the wrapped function while holding that lock

mod lock;
mod sync_func;

pub use lock::SharedLock;
pub use sync_func::SyncFunc;
