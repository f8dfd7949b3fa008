//! The function contract every decorator wraps and implements.
//!
//! A [`Func`] turns one input into one output or fails. Decorators are
//! themselves `Func`s, so they nest freely:
//!
//! ```rust,ignore
//! let guarded = TimedFunc::new(
//!     RetryFunc::with_attempts(StickyFunc::new(base), 3)?,
//!     Duration::from_secs(1),
//! );
//! ```

use crate::errors::Result;
use std::fmt::Debug;
use std::sync::Arc;

/// A fallible single-input, single-output computation.
///
/// Implementations must be callable from many threads at once. Nothing
/// beyond that is assumed: calling twice with equal inputs may yield
/// different outputs.
pub trait Func<X, Y>: Send + Sync {
    /// Applies the function to `input`.
    fn apply(&self, input: X) -> Result<Y>;
}

impl<X, Y, F> Func<X, Y> for &F
where
    F: Func<X, Y> + ?Sized,
{
    fn apply(&self, input: X) -> Result<Y> {
        (**self).apply(input)
    }
}

impl<X, Y, F> Func<X, Y> for Arc<F>
where
    F: Func<X, Y> + ?Sized,
{
    fn apply(&self, input: X) -> Result<Y> {
        (**self).apply(input)
    }
}

impl<X, Y, F> Func<X, Y> for Box<F>
where
    F: Func<X, Y> + ?Sized,
{
    fn apply(&self, input: X) -> Result<Y> {
        (**self).apply(input)
    }
}

/// A closure-backed function.
pub struct FuncOf<F> {
    func: F,
}

impl<F> FuncOf<F> {
    /// Wraps a closure.
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Debug for FuncOf<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FuncOf").finish_non_exhaustive()
    }
}

impl<X, Y, F> Func<X, Y> for FuncOf<F>
where
    F: Fn(X) -> Result<Y> + Send + Sync,
{
    fn apply(&self, input: X) -> Result<Y> {
        (self.func)(input)
    }
}
