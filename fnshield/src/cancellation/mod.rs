//! Cooperative cancellation.
//!
//! This module provides:
//! - CancellationToken for cooperative cancellation and interruptible sleeps
//! - A per-thread current token, the interrupt flag of a thread of control

mod current;
mod token;

pub use current::{check, current, is_cancelled, scope, sleep};
pub use token::{CancelCallback, CancellationToken};
