//! Testing utilities for fnshield decorators.
//!
//! This module provides:
//! - Instrumented functions that count calls, fail on demand or sleep
//! - Assertions for decorator outcomes

mod assertions;
mod mocks;

pub use assertions::{assert_failed, assert_interrupted, assert_timed_out};
pub use mocks::{CountingFunc, FlakyFunc, SleepingFunc};
