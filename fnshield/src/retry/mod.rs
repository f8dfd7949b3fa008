//! Failure-driven retry with configurable stop conditions and backoff.
//!
//! This module provides:
//! - RetryFunc, re-invoking a failing function until a stop condition holds
//! - StopCondition: attempt count, attempt predicate or elapsed time
//! - Backoff schedules with jitter for the sleeps between attempts

mod backoff;
mod retry_func;

pub use backoff::{Backoff, BackoffStrategy, JitterStrategy};
pub use retry_func::{AttemptPredicate, RetryFunc, StopCondition};
