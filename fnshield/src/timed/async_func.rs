//! Background submission of function calls.

use super::{Executor, TaskHandle, ThreadExecutor};
use crate::cancellation;
use crate::errors::{FuncError, Result};
use crate::func::Func;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, debug_span, warn};

/// Runs the wrapped function on an executor and returns a [`TaskHandle`]
/// immediately.
///
/// The function runs with the task's cancellation token installed as the
/// worker thread's current token. A panic inside the function is caught and
/// reported as [`FuncError::Panicked`].
pub struct AsyncFunc<F, E = ThreadExecutor> {
    func: Arc<F>,
    executor: E,
}

impl<F> AsyncFunc<F, ThreadExecutor> {
    /// Runs each call on a fresh, privately spawned thread.
    pub fn new(func: F) -> Self {
        Self::with_executor(func, ThreadExecutor::new())
    }
}

impl<F, E> AsyncFunc<F, E> {
    /// Runs each call on `executor`.
    pub fn with_executor(func: F, executor: E) -> Self {
        Self {
            func: Arc::new(func),
            executor,
        }
    }

    /// Returns the executor.
    pub const fn executor(&self) -> &E {
        &self.executor
    }
}

impl<F, E> AsyncFunc<F, E>
where
    E: Executor,
{
    /// Submits one call and returns its handle without waiting.
    pub fn submit<X, Y>(&self, input: X) -> Result<TaskHandle<Y>>
    where
        F: Func<X, Y> + 'static,
        X: Send + 'static,
        Y: Send + 'static,
    {
        let (handle, completion) = TaskHandle::pair();
        let func = Arc::clone(&self.func);
        let token = Arc::clone(handle.token());
        let id = handle.id();

        self.executor.execute(Box::new(move || {
            let span = debug_span!("background_task", task_id = %id);
            let _entered = span.enter();
            debug!("Background task started");

            let outcome = catch_unwind(AssertUnwindSafe(|| {
                cancellation::scope(token, || func.apply(input))
            }))
            .unwrap_or_else(|payload| {
                let message = panic_message(payload.as_ref());
                warn!(panic = %message, "Background task panicked");
                Err(FuncError::Panicked(message))
            });

            debug!(ok = outcome.is_ok(), "Background task finished");
            completion.complete(outcome);
        }))?;

        Ok(handle)
    }
}

impl<X, Y, F, E> Func<X, TaskHandle<Y>> for AsyncFunc<F, E>
where
    F: Func<X, Y> + 'static,
    E: Executor,
    X: Send + 'static,
    Y: Send + 'static,
{
    fn apply(&self, input: X) -> Result<TaskHandle<Y>> {
        self.submit(input)
    }
}

impl<F, E> std::fmt::Debug for AsyncFunc<F, E>
where
    E: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncFunc")
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::func::FuncOf;
    use crate::testing::{assert_interrupted, SleepingFunc};
    use crate::timed::TaskState;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[test]
    fn test_submit_returns_immediately() {
        let slow = AsyncFunc::new(SleepingFunc::new(Duration::from_millis(200)));

        let started = std::time::Instant::now();
        let handle = slow.submit("later").unwrap();
        assert!(started.elapsed() < Duration::from_millis(150));
        assert_eq!(handle.state(), TaskState::Running);

        assert_eq!(handle.wait().unwrap(), "later");
    }

    #[test]
    fn test_runs_on_named_executor_thread() {
        let func = AsyncFunc::with_executor(
            FuncOf::new(|_: ()| -> Result<Option<String>> {
                Ok(std::thread::current().name().map(str::to_string))
            }),
            ThreadExecutor::named("async-test"),
        );

        let name = func.apply(()).unwrap().wait().unwrap();
        assert_eq!(name.as_deref(), Some("async-test-1"));
    }

    #[test]
    fn test_panic_reported_as_error() {
        let func = AsyncFunc::new(FuncOf::new(|x: u8| -> Result<u8> {
            if x == 0 {
                panic!("zero is not allowed");
            }
            Ok(x)
        }));

        let err = func.submit(0).unwrap().wait().unwrap_err();
        match err {
            FuncError::Panicked(message) => assert_eq!(message, "zero is not allowed"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(func.submit(3).unwrap().wait().unwrap(), 3);
    }

    #[test]
    fn test_cancel_reaches_wrapped_function() {
        let sleeper = Arc::new(SleepingFunc::new(Duration::from_secs(3600)));
        let func = AsyncFunc::new(Arc::clone(&sleeper));

        let handle = func.submit(1u32).unwrap();
        std::thread::sleep(Duration::from_millis(20));
        assert!(handle.cancel());

        assert_interrupted(&handle.wait());
        for _ in 0..200 {
            if sleeper.interrupted() == 1 {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(sleeper.interrupted(), 1);
    }

    #[test]
    fn test_panic_message_payloads() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42u8), "unknown panic payload");
    }
}
