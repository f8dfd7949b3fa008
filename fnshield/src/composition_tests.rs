//! Tests for decorators nested inside each other.

#[cfg(test)]
mod tests {
    use crate::caching::{SolidFunc, StickyFunc};
    use crate::cancellation;
    use crate::errors::{FuncError, Result};
    use crate::func::{Func, FuncOf};
    use crate::observability::init_tracing;
    use crate::retry::{Backoff, RetryFunc};
    use crate::sync::SyncFunc;
    use crate::testing::{assert_interrupted, assert_timed_out, CountingFunc, FlakyFunc};
    use crate::timed::TimedFunc;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    #[test]
    fn test_timed_retry_cached_happy_path() {
        init_tracing("fnshield=debug");
        let base = Arc::new(FlakyFunc::new(2, |x: u64| Ok(x * x)));
        let guarded = TimedFunc::new(
            RetryFunc::with_attempts(SolidFunc::new(Arc::clone(&base)), 3).unwrap(),
            Duration::from_secs(5),
        );

        assert_eq!(guarded.apply(12).unwrap(), 144);
        assert_eq!(guarded.apply(12).unwrap(), 144);
        assert_eq!(base.calls(), 3);
    }

    #[test]
    fn test_timed_bounds_total_retry_time() {
        let base = Arc::new(CountingFunc::new(|_: u8| -> Result<u8> {
            Err(FuncError::failed("down"))
        }));
        let guarded = TimedFunc::new(
            RetryFunc::within(Arc::clone(&base), Duration::from_secs(3600))
                .with_backoff(Backoff::constant(Duration::from_millis(30)))
                .unwrap(),
            Duration::from_millis(150),
        );

        let started = Instant::now();
        assert_timed_out(&guarded.apply(0));
        assert!(started.elapsed() < Duration::from_secs(1));

        // The retry loop sleeps on the cancelled worker token and stops.
        std::thread::sleep(Duration::from_millis(100));
        let settled = base.calls();
        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(base.calls(), settled);
    }

    #[test]
    fn test_retry_around_timed_retries_timeouts() {
        let calls = Arc::new(AtomicUsize::new(0));
        let slow_then_fast = {
            let calls = Arc::clone(&calls);
            FuncOf::new(move |x: u32| -> Result<u32> {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    cancellation::sleep(Duration::from_secs(3600))?;
                }
                Ok(x)
            })
        };
        let guarded = RetryFunc::with_attempts(
            TimedFunc::new(slow_then_fast, Duration::from_millis(50)),
            2,
        )
        .unwrap();

        assert_eq!(guarded.apply(8).unwrap(), 8);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_nested_timed_cancels_inner_task() {
        let inner_token = Arc::new(Mutex::new(None));
        let probe = {
            let inner_token = Arc::clone(&inner_token);
            FuncOf::new(move |_: ()| -> Result<()> {
                *inner_token.lock() = Some(cancellation::current());
                cancellation::sleep(Duration::from_secs(3600))
            })
        };
        let outer = TimedFunc::new(
            TimedFunc::new(probe, Duration::from_secs(3600)),
            Duration::from_millis(50),
        );

        assert_timed_out(&outer.apply(()));

        let mut cancelled = false;
        for _ in 0..200 {
            if let Some(token) = inner_token.lock().as_ref() {
                if token.is_cancelled() {
                    cancelled = true;
                    break;
                }
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(cancelled);
    }

    #[test]
    fn test_sync_around_sticky_behaves_like_solid() {
        let base = Arc::new(CountingFunc::new(|x: u32| {
            std::thread::sleep(Duration::from_millis(10));
            Ok(x)
        }));
        let guarded = Arc::new(SyncFunc::new(StickyFunc::new(Arc::clone(&base))));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let guarded = Arc::clone(&guarded);
                std::thread::spawn(move || guarded.apply(3))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap().unwrap(), 3);
        }
        assert_eq!(base.calls(), 1);

        assert_eq!(guarded.apply(3).unwrap(), 3);
        assert_eq!(base.calls(), 1);
    }

    #[test]
    fn test_interrupted_retry_not_cached() {
        let token = Arc::new(cancellation::CancellationToken::new());
        token.cancel("stop");
        let base = CountingFunc::new(|_: u8| -> Result<u8> { Err(FuncError::failed("flaky")) });
        let sticky = StickyFunc::new(
            RetryFunc::until(&base, |_| false)
                .with_backoff(Backoff::constant(Duration::from_secs(1)))
                .unwrap(),
        );

        assert_interrupted(&cancellation::scope(token, || sticky.apply(1)));
        assert!(sticky.is_empty());
        assert_eq!(base.calls(), 1);
    }

    #[test]
    fn test_trait_objects_compose() {
        let sticky: StickyFunc<_, u32, u32> =
            StickyFunc::new(FuncOf::new(|x: u32| -> Result<u32> { Ok(x + 1) }));
        let stack: Vec<Box<dyn Func<u32, u32>>> = vec![
            Box::new(sticky),
            Box::new(RetryFunc::with_attempts(FuncOf::new(|x: u32| -> Result<u32> { Ok(x + 2) }), 2).unwrap()),
            Box::new(SyncFunc::new(FuncOf::new(|x: u32| -> Result<u32> { Ok(x + 3) }))),
            Box::new(TimedFunc::new(FuncOf::new(|x: u32| -> Result<u32> { Ok(x + 4) }), Duration::from_secs(5))),
        ];

        let outputs: Vec<u32> = stack.iter().map(|f| f.apply(10).unwrap()).collect();
        assert_eq!(outputs, vec![11, 12, 13, 14]);
    }
}
