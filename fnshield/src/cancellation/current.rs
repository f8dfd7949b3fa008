//! The cancellation token bound to the current thread.
//!
//! Each thread of control has one current token, created lazily. Background
//! workers run their function inside [`scope`] so that code deep inside the
//! wrapped function can observe cancellation without the token being passed
//! through every signature.

use super::CancellationToken;
use crate::errors::Result;
use std::cell::RefCell;
use std::sync::Arc;
use std::time::Duration;

thread_local! {
    static CURRENT: RefCell<Option<Arc<CancellationToken>>> = const { RefCell::new(None) };
}

/// Returns the current thread's token, creating one on first use.
pub fn current() -> Arc<CancellationToken> {
    CURRENT.with(|slot| {
        slot.borrow_mut()
            .get_or_insert_with(|| Arc::new(CancellationToken::new()))
            .clone()
    })
}

/// Runs `f` with `token` as the current thread's token.
///
/// The previous token is restored when `f` returns or unwinds.
pub fn scope<R>(token: Arc<CancellationToken>, f: impl FnOnce() -> R) -> R {
    let previous = CURRENT.with(|slot| slot.replace(Some(token)));
    let _restore = Restore(previous);
    f()
}

/// Returns true if the current thread's token was cancelled.
pub fn is_cancelled() -> bool {
    CURRENT.with(|slot| {
        slot.borrow()
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    })
}

/// Fails with an interruption if the current thread's token was cancelled.
pub fn check() -> Result<()> {
    current().check()
}

/// Sleeps on the current thread's token.
pub fn sleep(duration: Duration) -> Result<()> {
    current().sleep(duration)
}

struct Restore(Option<Arc<CancellationToken>>);

impl Drop for Restore {
    fn drop(&mut self) {
        let previous = self.0.take();
        CURRENT.with(|slot| *slot.borrow_mut() = previous);
    }
}
