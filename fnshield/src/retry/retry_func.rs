//! Retry decorator.

use super::Backoff;
use crate::cancellation;
use crate::errors::{FuncError, Result};
use crate::func::Func;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Predicate over the 1-based number of the attempt that just failed.
pub type AttemptPredicate = Arc<dyn Fn(u32) -> bool + Send + Sync>;

/// Decides when a retry loop gives up.
#[derive(Clone)]
pub enum StopCondition {
    /// Stop after this many attempts, counting the first one.
    Attempts(u32),
    /// Stop once the predicate returns true for the failed attempt number.
    Predicate(AttemptPredicate),
    /// Stop once this much time has passed since the first attempt.
    ///
    /// Attempts are spaced by a backoff schedule.
    Elapsed(Duration),
}

impl StopCondition {
    /// Stops once `predicate(attempt)` holds.
    pub fn predicate<P>(predicate: P) -> Self
    where
        P: Fn(u32) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(predicate))
    }

    /// Checks that the condition can ever allow an attempt.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Attempts(0) => Err(FuncError::configuration(
                "max attempts must be at least 1",
            )),
            _ => Ok(()),
        }
    }

    fn should_stop(&self, state: &RetryState) -> bool {
        match self {
            Self::Attempts(max) => state.attempt >= *max,
            Self::Predicate(predicate) => predicate(state.attempt),
            Self::Elapsed(max) => state.started.elapsed() >= *max,
        }
    }
}

impl std::fmt::Debug for StopCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Attempts(max) => f.debug_tuple("Attempts").field(max).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
            Self::Elapsed(max) => f.debug_tuple("Elapsed").field(max).finish(),
        }
    }
}

/// Per-call retry bookkeeping.
struct RetryState {
    /// Number of the attempt in progress, starting at 1.
    attempt: u32,
    started: Instant,
}

/// Re-invokes the wrapped function until it succeeds or the stop condition
/// holds.
///
/// When the loop gives up, the most recent failure of the wrapped function
/// is returned unchanged. Sleeps between attempts wait on the current
/// thread's cancellation token; cancelling it ends the loop with
/// [`FuncError::Interrupted`]. An interruption reported by the wrapped
/// function itself is never retried.
#[derive(Debug)]
pub struct RetryFunc<F> {
    func: F,
    stop: StopCondition,
    backoff: Option<Backoff>,
}

impl<F> RetryFunc<F> {
    /// Creates a retry decorator with an explicit stop condition.
    ///
    /// [`StopCondition::Elapsed`] gets the default [`Backoff`].
    pub fn new(func: F, stop: StopCondition) -> Result<Self> {
        stop.validate()?;
        let backoff = matches!(stop, StopCondition::Elapsed(_)).then(Backoff::default);
        Ok(Self {
            func,
            stop,
            backoff,
        })
    }

    /// Retries immediately, making at most `max_attempts` attempts.
    ///
    /// Zero attempts is rejected here, before anything runs.
    pub fn with_attempts(func: F, max_attempts: u32) -> Result<Self> {
        Self::new(func, StopCondition::Attempts(max_attempts))
    }

    /// Retries immediately until `predicate(attempt)` returns true.
    pub fn until<P>(func: F, predicate: P) -> Self
    where
        P: Fn(u32) -> bool + Send + Sync + 'static,
    {
        Self {
            func,
            stop: StopCondition::predicate(predicate),
            backoff: None,
        }
    }

    /// Retries with the default backoff until `max_elapsed` has passed.
    pub fn within(func: F, max_elapsed: Duration) -> Self {
        Self {
            func,
            stop: StopCondition::Elapsed(max_elapsed),
            backoff: Some(Backoff::default()),
        }
    }

    /// Sleeps between attempts according to `backoff`.
    pub fn with_backoff(mut self, backoff: Backoff) -> Result<Self> {
        backoff.validate()?;
        self.backoff = Some(backoff);
        Ok(self)
    }

    /// Returns the stop condition.
    pub const fn stop_condition(&self) -> &StopCondition {
        &self.stop
    }

    /// Returns the backoff schedule, if any.
    pub const fn backoff(&self) -> Option<&Backoff> {
        self.backoff.as_ref()
    }

    fn delay_after(&self, state: &RetryState) -> Option<Duration> {
        let backoff = self.backoff.as_ref()?;
        let delay = backoff.delay(state.attempt);
        match self.stop {
            StopCondition::Elapsed(max) => {
                Some(delay.min(max.saturating_sub(state.started.elapsed())))
            }
            _ => Some(delay),
        }
    }
}

impl<X, Y, F> Func<X, Y> for RetryFunc<F>
where
    F: Func<X, Y>,
    X: Clone,
{
    fn apply(&self, input: X) -> Result<Y> {
        let mut state = RetryState {
            attempt: 1,
            started: Instant::now(),
        };

        loop {
            let err = match self.func.apply(input.clone()) {
                Ok(output) => {
                    if state.attempt > 1 {
                        debug!(attempt = state.attempt, "Succeeded after retrying");
                    }
                    return Ok(output);
                }
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) => err,
            };

            if self.stop.should_stop(&state) {
                debug!(
                    attempt = state.attempt,
                    error = %err,
                    "Stop condition reached, giving up"
                );
                return Err(err);
            }

            match self.delay_after(&state) {
                Some(delay) => {
                    debug!(
                        attempt = state.attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "Retrying after error"
                    );
                    if let Err(interrupted) = cancellation::sleep(delay) {
                        warn!(attempt = state.attempt, "Retry interrupted during backoff");
                        return Err(interrupted);
                    }
                }
                None => {
                    debug!(attempt = state.attempt, error = %err, "Retrying after error");
                    if let Err(interrupted) = cancellation::check() {
                        warn!(attempt = state.attempt, "Retry interrupted");
                        return Err(interrupted);
                    }
                }
            }

            state.attempt = state.attempt.saturating_add(1);
        }
    }
}
