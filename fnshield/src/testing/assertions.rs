//! Test assertions for decorator outcomes.

use crate::errors::{FuncError, Result};
use std::fmt::Debug;

/// Asserts that the wrapped function's own failure surfaced.
pub fn assert_failed<T: Debug>(result: &Result<T>) {
    assert!(
        matches!(result, Err(FuncError::Failed(_))),
        "Expected function failure, got: {result:?}"
    );
}

/// Asserts that the call timed out.
pub fn assert_timed_out<T: Debug>(result: &Result<T>) {
    assert!(
        matches!(result, Err(FuncError::Timeout { .. })),
        "Expected timeout, got: {result:?}"
    );
}

/// Asserts that the call was interrupted.
pub fn assert_interrupted<T: Debug>(result: &Result<T>) {
    assert!(
        matches!(result, Err(FuncError::Interrupted { .. })),
        "Expected interruption, got: {result:?}"
    );
}
