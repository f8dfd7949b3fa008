//! Error types for the fnshield decorators.
//!
//! Every decorator reports exactly one attributable error kind: the wrapped
//! function's own failure, a configuration problem detected at construction,
//! an interrupted wait, or a timeout.

use std::time::Duration;
use thiserror::Error;

/// Result alias used by every [`Func`](crate::func::Func).
pub type Result<T> = std::result::Result<T, FuncError>;

/// The error type shared by all functions and decorators.
#[derive(Debug, Error)]
pub enum FuncError {
    /// The wrapped function failed.
    #[error("Function failed: {0}")]
    Failed(#[from] anyhow::Error),

    /// A decorator was constructed with invalid parameters.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// A blocking wait was interrupted through the thread's cancellation token.
    #[error("Interrupted: {reason}")]
    Interrupted {
        /// The cancellation reason.
        reason: String,
    },

    /// The function did not complete within its deadline.
    #[error("Timed out after {deadline:?}")]
    Timeout {
        /// The deadline that elapsed.
        deadline: Duration,
    },

    /// The background worker panicked before producing a result.
    #[error("Background task panicked: {0}")]
    Panicked(String),

    /// The executor refused to start a background task.
    #[error("Task rejected: {0}")]
    Rejected(String),
}

impl FuncError {
    /// Creates a function failure from a message.
    #[must_use]
    pub fn failed(message: impl std::fmt::Display + std::fmt::Debug + Send + Sync + 'static) -> Self {
        Self::Failed(anyhow::Error::msg(message))
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates an interruption error.
    #[must_use]
    pub fn interrupted(reason: impl Into<String>) -> Self {
        Self::Interrupted {
            reason: reason.into(),
        }
    }

    /// Creates a timeout error.
    #[must_use]
    pub const fn timeout(deadline: Duration) -> Self {
        Self::Timeout { deadline }
    }

    /// Returns true if this is the wrapped function's own failure.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Returns true for configuration errors.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Returns true for interrupted waits.
    #[must_use]
    pub const fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted { .. })
    }

    /// Returns true for timeouts.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns true if a retry loop may re-attempt after this error.
    ///
    /// Interruptions always end the loop.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        !self.is_interrupted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_from_message() {
        let err = FuncError::failed("boom");
        assert!(err.is_failed());
        assert_eq!(err.to_string(), "Function failed: boom");
    }

    #[test]
    fn test_failed_from_io_error() {
        fn read() -> Result<()> {
            let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
            Err(anyhow::Error::from(io).into())
        }

        let err = read().unwrap_err();
        assert!(err.is_failed());
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_timeout_display() {
        let err = FuncError::timeout(Duration::from_millis(100));
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "Timed out after 100ms");
    }

    #[test]
    fn test_interrupted_not_retryable() {
        assert!(!FuncError::interrupted("stop").is_retryable());
        assert!(FuncError::configuration("bad").is_retryable());
        assert!(FuncError::failed("flaky").is_retryable());
        assert!(FuncError::timeout(Duration::from_secs(1)).is_retryable());
    }
}
