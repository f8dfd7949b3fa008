//! Backoff schedules with jitter.

use crate::errors::{FuncError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Backoff strategy for retry delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// delay = base * 2^(attempt - 1)
    #[default]
    Exponential,
    /// delay = base * attempt
    Linear,
    /// delay = base (constant)
    Constant,
}

/// Jitter strategy to prevent thundering herd.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JitterStrategy {
    /// No jitter
    #[default]
    None,
    /// Random from 0 to delay
    Full,
    /// Half fixed, half random
    Equal,
    /// Random from delay to 3 * delay, capped at the maximum
    Decorrelated,
}

/// The delay schedule between retry attempts.
///
/// Delays grow with the attempt number according to `strategy`, are capped
/// at `max_delay_ms` and then jittered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Backoff {
    /// Delay after the first failed attempt, in milliseconds.
    pub base_delay_ms: u64,
    /// Maximum delay cap in milliseconds.
    pub max_delay_ms: u64,
    /// Backoff strategy.
    pub strategy: BackoffStrategy,
    /// Jitter strategy.
    pub jitter: JitterStrategy,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base_delay_ms: 100,
            max_delay_ms: 10_000,
            strategy: BackoffStrategy::Exponential,
            jitter: JitterStrategy::None,
        }
    }
}

impl Backoff {
    /// Creates the default exponential schedule.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an exponential schedule starting at `base`.
    #[must_use]
    pub fn exponential(base: Duration) -> Self {
        Self::new()
            .with_base_delay(base)
            .with_strategy(BackoffStrategy::Exponential)
    }

    /// Creates a linear schedule starting at `base`.
    #[must_use]
    pub fn linear(base: Duration) -> Self {
        Self::new()
            .with_base_delay(base)
            .with_strategy(BackoffStrategy::Linear)
    }

    /// Creates a schedule that always waits `delay`.
    #[must_use]
    pub fn constant(delay: Duration) -> Self {
        Self::new()
            .with_base_delay(delay)
            .with_max_delay(delay)
            .with_strategy(BackoffStrategy::Constant)
    }

    /// Sets the base delay.
    #[must_use]
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay_ms = duration_ms(delay);
        self
    }

    /// Sets the maximum delay.
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay_ms = duration_ms(delay);
        self
    }

    /// Sets the backoff strategy.
    #[must_use]
    pub const fn with_strategy(mut self, strategy: BackoffStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the jitter strategy.
    #[must_use]
    pub const fn with_jitter(mut self, jitter: JitterStrategy) -> Self {
        self.jitter = jitter;
        self
    }

    /// Checks that the schedule is usable.
    pub fn validate(&self) -> Result<()> {
        if self.max_delay_ms < self.base_delay_ms {
            return Err(FuncError::configuration(format!(
                "backoff max delay ({}ms) is below its base delay ({}ms)",
                self.max_delay_ms, self.base_delay_ms
            )));
        }
        Ok(())
    }

    /// Calculates the un-jittered delay after failed attempt `attempt` (1-based).
    #[must_use]
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay_ms;
        let step = attempt.max(1);

        let delay = match self.strategy {
            BackoffStrategy::Exponential => {
                base.saturating_mul(2u64.saturating_pow(step - 1))
            }
            BackoffStrategy::Linear => base.saturating_mul(u64::from(step)),
            BackoffStrategy::Constant => base,
        };

        Duration::from_millis(delay.min(self.max_delay_ms))
    }

    /// Calculates the jittered delay after failed attempt `attempt` (1-based).
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let delay = duration_ms(self.base_delay(attempt));
        let mut rng = rand::thread_rng();

        let jittered = match self.jitter {
            JitterStrategy::None => delay,
            JitterStrategy::Full => {
                if delay == 0 {
                    0
                } else {
                    rng.gen_range(0..=delay)
                }
            }
            JitterStrategy::Equal => {
                let half = delay / 2;
                if half == 0 {
                    delay
                } else {
                    half + rng.gen_range(0..=half)
                }
            }
            JitterStrategy::Decorrelated => {
                let upper = delay.saturating_mul(3).min(self.max_delay_ms);
                if upper <= delay {
                    delay
                } else {
                    rng.gen_range(delay..=upper)
                }
            }
        };

        Duration::from_millis(jittered)
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_backoff_default() {
        let backoff = Backoff::default();
        assert_eq!(backoff.strategy, BackoffStrategy::Exponential);
        assert_eq!(backoff.jitter, JitterStrategy::None);
        assert!(backoff.validate().is_ok());
    }

    #[test]
    fn test_exponential_delays() {
        let backoff = Backoff::exponential(Duration::from_millis(100));

        assert_eq!(backoff.delay(1), Duration::from_millis(100));
        assert_eq!(backoff.delay(2), Duration::from_millis(200));
        assert_eq!(backoff.delay(3), Duration::from_millis(400));
    }

    #[test]
    fn test_linear_delays() {
        let backoff = Backoff::linear(Duration::from_millis(100));

        assert_eq!(backoff.delay(1), Duration::from_millis(100));
        assert_eq!(backoff.delay(2), Duration::from_millis(200));
        assert_eq!(backoff.delay(3), Duration::from_millis(300));
    }

    #[test]
    fn test_constant_delays() {
        let backoff = Backoff::constant(Duration::from_millis(50));

        assert_eq!(backoff.delay(1), Duration::from_millis(50));
        assert_eq!(backoff.delay(9), Duration::from_millis(50));
    }

    #[test]
    fn test_delay_capped_at_max() {
        let backoff = Backoff::exponential(Duration::from_secs(1))
            .with_max_delay(Duration::from_secs(5));

        // Would be 512s without the cap.
        assert_eq!(backoff.delay(10), Duration::from_secs(5));
        assert_eq!(backoff.delay(200), Duration::from_secs(5));
    }

    #[test]
    fn test_jitter_bounds() {
        let full = Backoff::constant(Duration::from_millis(100)).with_jitter(JitterStrategy::Full);
        let equal = Backoff::constant(Duration::from_millis(100)).with_jitter(JitterStrategy::Equal);
        let decorrelated = Backoff::exponential(Duration::from_millis(100))
            .with_max_delay(Duration::from_millis(1000))
            .with_jitter(JitterStrategy::Decorrelated);

        for _ in 0..100 {
            assert!(full.delay(1) <= Duration::from_millis(100));

            let d = equal.delay(1);
            assert!(d >= Duration::from_millis(50) && d <= Duration::from_millis(100));

            let d = decorrelated.delay(1);
            assert!(d >= Duration::from_millis(100) && d <= Duration::from_millis(300));
        }
    }

    #[test]
    fn test_validate_rejects_inverted_bounds() {
        let backoff = Backoff::exponential(Duration::from_secs(2))
            .with_max_delay(Duration::from_secs(1));
        assert!(backoff.validate().unwrap_err().is_configuration());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let backoff: Backoff =
            serde_json::from_str(r#"{"base_delay_ms": 20, "strategy": "linear"}"#).unwrap();

        assert_eq!(backoff.base_delay_ms, 20);
        assert_eq!(backoff.strategy, BackoffStrategy::Linear);
        assert_eq!(backoff.max_delay_ms, Backoff::default().max_delay_ms);

        let json = serde_json::to_value(&backoff).unwrap();
        assert_eq!(json["jitter"], "none");
    }
}
