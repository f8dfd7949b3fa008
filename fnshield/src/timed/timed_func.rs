//! Deadline-bounded execution.

use super::{AsyncFunc, Executor, ThreadExecutor};
use crate::errors::{FuncError, Result};
use crate::func::Func;
use std::time::Duration;
use tracing::warn;

/// Runs the wrapped function in the background and fails with
/// [`FuncError::Timeout`] if it does not finish within the deadline.
///
/// On timeout the background task is cancelled and abandoned: the caller
/// returns at once, and the function keeps running until it notices its
/// cancellation token. Failures of the function are returned unchanged.
///
/// Usually the outermost decorator, so that the deadline covers the
/// combined latency of everything it wraps.
pub struct TimedFunc<F, E = ThreadExecutor> {
    inner: AsyncFunc<F, E>,
    deadline: Duration,
}

impl<F> TimedFunc<F, ThreadExecutor> {
    /// Bounds every call by `deadline`, running each on a private thread.
    pub fn new(func: F, deadline: Duration) -> Self {
        Self::with_executor(func, deadline, ThreadExecutor::new())
    }
}

impl<F, E> TimedFunc<F, E> {
    /// Bounds every call by `deadline`, running each on `executor`.
    pub fn with_executor(func: F, deadline: Duration, executor: E) -> Self {
        Self {
            inner: AsyncFunc::with_executor(func, executor),
            deadline,
        }
    }

    /// Returns the default deadline.
    pub const fn deadline(&self) -> Duration {
        self.deadline
    }
}

impl<F, E> TimedFunc<F, E>
where
    E: Executor,
{
    /// Applies the function, bounded by `deadline` instead of the default.
    ///
    /// The deadline counts from this call.
    pub fn apply_within<X, Y>(&self, input: X, deadline: Duration) -> Result<Y>
    where
        F: Func<X, Y> + 'static,
        X: Send + 'static,
        Y: Send + 'static,
    {
        let task = self.inner.submit(input)?;
        let id = task.id();

        task.join_within(deadline).map_err(|err| {
            if let FuncError::Timeout { .. } = err {
                warn!(
                    task_id = %id,
                    deadline_ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
                    "Deadline exceeded, background task cancelled"
                );
            }
            err
        })
    }
}

impl<X, Y, F, E> Func<X, Y> for TimedFunc<F, E>
where
    F: Func<X, Y> + 'static,
    E: Executor,
    X: Send + 'static,
    Y: Send + 'static,
{
    fn apply(&self, input: X) -> Result<Y> {
        self.apply_within(input, self.deadline)
    }
}

impl<F, E> std::fmt::Debug for TimedFunc<F, E>
where
    E: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimedFunc")
            .field("deadline", &self.deadline)
            .field("inner", &self.inner)
            .finish()
    }
}
