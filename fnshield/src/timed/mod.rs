//! Background execution with deadlines and cooperative cancellation.
//!
//! This module provides:
//! - Executors that run jobs on another thread of control
//! - TaskHandle, the caller's view of one background execution
//! - AsyncFunc, submitting a function call and returning its handle
//! - TimedFunc, failing with a timeout when the call outlives its deadline
//!
//! Cancellation is cooperative. A timed-out task keeps running until the
//! wrapped function observes its cancellation token, either through
//! [`cancellation::check`](crate::cancellation::check) or an interruptible
//! [`cancellation::sleep`](crate::cancellation::sleep). Honoring the token
//! is the wrapped function's obligation.

mod async_func;
mod executor;
mod task;
mod timed_func;

pub use async_func::AsyncFunc;
#[cfg(feature = "tokio")]
pub use executor::TokioExecutor;
pub use executor::{Executor, Job, ThreadExecutor};
pub use task::{TaskHandle, TaskState};
pub use timed_func::TimedFunc;
