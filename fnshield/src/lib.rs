//! # fnshield
//!
//! Composable decorators around fallible functions.
//!
//! Every decorator implements [`Func`](func::Func) and wraps another
//! `Func`, so they stack freely:
//!
//! - **Caching**: [`StickyFunc`](caching::StickyFunc) memoizes without
//!   coordination, [`SolidFunc`](caching::SolidFunc) computes each key at
//!   most once even under contention
//! - **Retry**: [`RetryFunc`](retry::RetryFunc) re-invokes on failure until a
//!   stop condition holds, optionally with backoff
//! - **Deadlines**: [`TimedFunc`](timed::TimedFunc) runs the call in the
//!   background and cancels it when the deadline passes
//! - **Mutual exclusion**: [`SyncFunc`](sync::SyncFunc) serializes calls on a
//!   shared lock
//!
//! Cancellation is cooperative. Each thread has a current
//! [`CancellationToken`](cancellation::CancellationToken); blocking waits in
//! this crate observe it, and long-running functions should call
//! [`cancellation::check`] or [`cancellation::sleep`].
//!
//! ## Quick Start
//!
//! ```rust
//! use fnshield::prelude::*;
//! use std::time::Duration;
//!
//! let lookup = FuncOf::new(|id: u32| -> fnshield::errors::Result<String> {
//!     Ok(format!("user-{id}"))
//! });
//!
//! let guarded = TimedFunc::new(
//!     RetryFunc::with_attempts(SolidFunc::new(lookup), 3)?,
//!     Duration::from_secs(1),
//! );
//!
//! assert_eq!(guarded.apply(7)?, "user-7");
//! # Ok::<(), fnshield::errors::FuncError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod caching;
pub mod cancellation;
pub mod errors;
pub mod func;
pub mod observability;
pub mod retry;
pub mod sync;
pub mod testing;
pub mod timed;

mod composition_tests;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::caching::{FifoCache, SolidFunc, StickyFunc};
    pub use crate::cancellation::CancellationToken;
    pub use crate::errors::FuncError;
    pub use crate::func::{Func, FuncOf};
    pub use crate::retry::{Backoff, BackoffStrategy, JitterStrategy, RetryFunc, StopCondition};
    pub use crate::sync::{SharedLock, SyncFunc};
    pub use crate::timed::{AsyncFunc, Executor, TaskHandle, TaskState, ThreadExecutor, TimedFunc};
}
