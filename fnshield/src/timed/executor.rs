//! Executors running background jobs.

use crate::errors::{FuncError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A unit of background work.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs jobs on a thread of control other than the caller's.
pub trait Executor: Send + Sync {
    /// Starts `job`. Must not wait for it to finish.
    fn execute(&self, job: Job) -> Result<()>;
}

impl<E> Executor for Arc<E>
where
    E: Executor + ?Sized,
{
    fn execute(&self, job: Job) -> Result<()> {
        (**self).execute(job)
    }
}

/// Spawns a dedicated, named OS thread per job.
///
/// Threads are named `{prefix}-{n}` with `n` counting up from 1.
#[derive(Debug)]
pub struct ThreadExecutor {
    name_prefix: String,
    stack_size: Option<usize>,
    spawned: AtomicUsize,
}

impl ThreadExecutor {
    /// Creates an executor naming its threads `fnshield-worker-{n}`.
    #[must_use]
    pub fn new() -> Self {
        Self::named("fnshield-worker")
    }

    /// Creates an executor naming its threads `{prefix}-{n}`.
    #[must_use]
    pub fn named(prefix: impl Into<String>) -> Self {
        Self {
            name_prefix: prefix.into(),
            stack_size: None,
            spawned: AtomicUsize::new(0),
        }
    }

    /// Sets the stack size of spawned threads.
    #[must_use]
    pub const fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    /// Returns the number of threads spawned so far.
    #[must_use]
    pub fn spawned(&self) -> usize {
        self.spawned.load(Ordering::SeqCst)
    }
}

impl Default for ThreadExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for ThreadExecutor {
    fn execute(&self, job: Job) -> Result<()> {
        let n = self.spawned.fetch_add(1, Ordering::SeqCst) + 1;
        let mut builder = std::thread::Builder::new().name(format!("{}-{n}", self.name_prefix));
        if let Some(bytes) = self.stack_size {
            builder = builder.stack_size(bytes);
        }

        // Detached: the caller never joins a worker.
        builder
            .spawn(job)
            .map(drop)
            .map_err(|e| FuncError::Rejected(format!("failed to spawn worker thread: {e}")))
    }
}

/// Runs jobs on a Tokio runtime's blocking thread pool.
#[cfg(feature = "tokio")]
#[derive(Debug, Clone)]
pub struct TokioExecutor {
    handle: tokio::runtime::Handle,
}

#[cfg(feature = "tokio")]
impl TokioExecutor {
    /// Uses the given runtime.
    #[must_use]
    pub const fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Uses the runtime the caller is running on.
    pub fn current() -> Result<Self> {
        tokio::runtime::Handle::try_current()
            .map(Self::new)
            .map_err(|e| FuncError::Rejected(format!("no Tokio runtime available: {e}")))
    }
}

#[cfg(feature = "tokio")]
impl Executor for TokioExecutor {
    fn execute(&self, job: Job) -> Result<()> {
        drop(self.handle.spawn_blocking(job));
        Ok(())
    }
}
