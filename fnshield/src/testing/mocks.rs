//! Instrumented functions for testing decorators.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::cancellation;
use crate::errors::{FuncError, Result};
use crate::func::Func;

/// A function that counts how often it was invoked.
pub struct CountingFunc<F> {
    func: F,
    calls: AtomicUsize,
}

impl<F> CountingFunc<F> {
    /// Wraps `func`.
    pub fn new<X, Y>(func: F) -> Self
    where
        F: Fn(X) -> Result<Y>,
    {
        Self {
            func,
            calls: AtomicUsize::new(0),
        }
    }

    /// Returns the number of invocations so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<X, Y, F> Func<X, Y> for CountingFunc<F>
where
    F: Fn(X) -> Result<Y> + Send + Sync,
{
    fn apply(&self, input: X) -> Result<Y> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.func)(input)
    }
}

impl<F> std::fmt::Debug for CountingFunc<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CountingFunc")
            .field("calls", &self.calls())
            .finish_non_exhaustive()
    }
}

/// A function that fails its first `failures` invocations.
pub struct FlakyFunc<F> {
    func: F,
    failures: usize,
    calls: AtomicUsize,
}

impl<F> FlakyFunc<F> {
    /// Fails `failures` times, then delegates to `func`.
    pub fn new<X, Y>(failures: usize, func: F) -> Self
    where
        F: Fn(X) -> Result<Y>,
    {
        Self {
            func,
            failures,
            calls: AtomicUsize::new(0),
        }
    }

    /// Returns the number of invocations so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<X, Y, F> Func<X, Y> for FlakyFunc<F>
where
    F: Fn(X) -> Result<Y> + Send + Sync,
{
    fn apply(&self, input: X) -> Result<Y> {
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.failures {
            return Err(FuncError::failed(format!("attempt {attempt} failed")));
        }
        (self.func)(input)
    }
}

impl<F> std::fmt::Debug for FlakyFunc<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlakyFunc")
            .field("failures", &self.failures)
            .field("calls", &self.calls())
            .finish_non_exhaustive()
    }
}

/// A function that sleeps cooperatively before echoing its input.
///
/// The sleep observes the current thread's cancellation token, so a timed
/// caller's cancellation ends it early with an interruption.
#[derive(Debug)]
pub struct SleepingFunc {
    delay: Duration,
    interrupted: Mutex<usize>,
    completed: Mutex<usize>,
}

impl SleepingFunc {
    /// Creates a function sleeping `delay` per call.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            interrupted: Mutex::new(0),
            completed: Mutex::new(0),
        }
    }

    /// Returns how many calls were cut short by cancellation.
    #[must_use]
    pub fn interrupted(&self) -> usize {
        *self.interrupted.lock()
    }

    /// Returns how many calls slept their full delay.
    #[must_use]
    pub fn completed(&self) -> usize {
        *self.completed.lock()
    }
}

impl<X> Func<X, X> for SleepingFunc
where
    X: Send,
{
    fn apply(&self, input: X) -> Result<X> {
        match cancellation::sleep(self.delay) {
            Ok(()) => {
                *self.completed.lock() += 1;
                Ok(input)
            }
            Err(err) => {
                *self.interrupted.lock() += 1;
                Err(err)
            }
        }
    }
}
