//! Cancellation token for cooperative cancellation.

use crate::errors::{FuncError, Result};
use parking_lot::{Condvar, Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::warn;

/// A callback type for cancellation notifications.
pub type CancelCallback = Box<dyn Fn() + Send + Sync>;

/// A token for cooperative cancellation.
///
/// Cancellation is idempotent - only the first cancellation reason is kept.
/// Threads sleeping through [`CancellationToken::sleep`] are woken as soon
/// as the token is cancelled.
#[derive(Default)]
pub struct CancellationToken {
    /// Whether cancellation has been requested.
    cancelled: AtomicBool,
    /// The reason for cancellation (first one wins).
    reason: RwLock<Option<String>>,
    /// Callbacks to invoke on cancellation.
    callbacks: RwLock<Vec<CancelCallback>>,
    /// Guards the sleep condition so a wakeup cannot be missed.
    gate: Mutex<()>,
    wakeup: Condvar,
}

impl CancellationToken {
    /// Creates a new cancellation token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation with a reason.
    ///
    /// This is idempotent - only the first reason is kept.
    /// Sleepers are woken, then the registered callbacks are invoked once
    /// and dropped. Panics in callbacks are logged and suppressed.
    pub fn cancel(&self, reason: impl Into<String>) {
        let mut slot = self.reason.write();
        if self
            .cancelled
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            *slot = Some(reason.into());
            drop(slot);

            {
                let _gate = self.gate.lock();
                self.wakeup.notify_all();
            }

            let callbacks = std::mem::take(&mut *self.callbacks.write());
            for callback in &callbacks {
                run_callback(&**callback);
            }
        }
    }

    /// Registers a callback to be invoked on cancellation.
    ///
    /// If already cancelled, the callback is invoked immediately.
    pub fn on_cancel<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut callbacks = self.callbacks.write();
        // Checked under the lock so a concurrent cancel either drains this
        // callback or is already visible here.
        if self.is_cancelled() {
            drop(callbacks);
            run_callback(&callback);
        } else {
            callbacks.push(Box::new(callback));
        }
    }

    /// Returns whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Returns the cancellation reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        self.reason.read().clone()
    }

    /// Fails with [`FuncError::Interrupted`] if cancellation was requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(self.interrupted())
        } else {
            Ok(())
        }
    }

    /// Sleeps for `duration` unless cancelled first.
    ///
    /// Returns [`FuncError::Interrupted`] when the token is (or becomes)
    /// cancelled; the sleep is never resumed after a wakeup.
    pub fn sleep(&self, duration: Duration) -> Result<()> {
        let mut gate = self.gate.lock();
        self.wakeup
            .wait_while_for(&mut gate, |_| !self.is_cancelled(), duration);
        drop(gate);
        self.check()
    }

    /// Clears the cancellation flag and reason.
    ///
    /// Registered callbacks are dropped too.
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
        *self.reason.write() = None;
        self.callbacks.write().clear();
    }

    fn interrupted(&self) -> FuncError {
        FuncError::interrupted(self.reason().unwrap_or_else(|| "cancelled".to_string()))
    }
}

fn run_callback(callback: &dyn Fn()) {
    if let Err(e) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(callback)) {
        warn!("Cancellation callback panicked: {:?}", e);
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .field("reason", &self.reason())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::time::Instant;

    #[test]
    fn test_token_default_not_cancelled() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        assert!(token.reason().is_none());
        assert!(token.check().is_ok());
    }

    #[test]
    fn test_token_cancel_idempotent() {
        let token = CancellationToken::new();
        token.cancel("First reason");
        token.cancel("Second reason");

        assert!(token.is_cancelled());
        assert_eq!(token.reason(), Some("First reason".to_string()));
    }

    #[test]
    fn test_on_cancel_before_and_after_cancellation() {
        let token = CancellationToken::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let c = counter.clone();
        token.on_cancel(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        token.cancel("test");
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        let c = counter.clone();
        token.on_cancel(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_callback_panic_suppressed() {
        let token = CancellationToken::new();
        token.on_cancel(|| panic!("Intentional panic"));

        token.cancel("test");
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_callbacks_racing_cancel_run_exactly_once() {
        for _ in 0..200 {
            let token = Arc::new(CancellationToken::new());
            let counter = Arc::new(AtomicUsize::new(0));
            let barrier = Arc::new(std::sync::Barrier::new(3));

            let registrars: Vec<_> = (0..2)
                .map(|_| {
                    let token = token.clone();
                    let counter = counter.clone();
                    let barrier = barrier.clone();
                    std::thread::spawn(move || {
                        barrier.wait();
                        for _ in 0..10 {
                            let c = counter.clone();
                            token.on_cancel(move || {
                                c.fetch_add(1, Ordering::SeqCst);
                            });
                        }
                    })
                })
                .collect();

            barrier.wait();
            token.cancel("race");
            for registrar in registrars {
                registrar.join().unwrap();
            }

            assert_eq!(counter.load(Ordering::SeqCst), 20);
        }
    }

    #[test]
    fn test_sleep_runs_full_duration_when_not_cancelled() {
        let token = CancellationToken::new();
        let started = Instant::now();

        assert!(token.sleep(Duration::from_millis(30)).is_ok());
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_sleep_interrupted_by_cancel() {
        let token = Arc::new(CancellationToken::new());
        let canceller = {
            let token = token.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(50));
                token.cancel("wake up");
            })
        };

        let started = Instant::now();
        let err = token.sleep(Duration::from_secs(60)).unwrap_err();
        canceller.join().unwrap();

        assert!(started.elapsed() < Duration::from_secs(10));
        match err {
            FuncError::Interrupted { reason } => assert_eq!(reason, "wake up"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_sleep_after_cancel_returns_immediately() {
        let token = CancellationToken::new();
        token.cancel("already");

        let started = Instant::now();
        assert!(token.sleep(Duration::from_secs(60)).unwrap_err().is_interrupted());
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_reset() {
        let token = CancellationToken::new();
        token.cancel("once");
        token.reset();

        assert!(!token.is_cancelled());
        assert!(token.reason().is_none());
    }
}
