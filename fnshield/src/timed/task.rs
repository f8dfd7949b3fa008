//! Handles to background executions.

use crate::cancellation::{self, CancellationToken};
use crate::errors::{FuncError, Result};
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// How often a waiting caller re-checks its own cancellation token.
const CALLER_POLL: Duration = Duration::from_millis(10);

/// Lifecycle of a background execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// The function is still running (or waiting to start).
    Running,
    /// The function returned a value.
    Completed,
    /// The function failed or panicked.
    Failed,
    /// Cancellation was requested before the function finished.
    Cancelled,
}

impl TaskState {
    /// Returns true for every state but `Running`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

struct TaskSlot<Y> {
    /// Written only by the worker side.
    state: TaskState,
    outcome: Option<Result<Y>>,
}

struct TaskShared<Y> {
    id: Uuid,
    token: Arc<CancellationToken>,
    slot: Mutex<TaskSlot<Y>>,
    done: Condvar,
}

/// The caller's handle to one background execution.
///
/// Dropping the handle neither waits for nor cancels the execution.
pub struct TaskHandle<Y> {
    shared: Arc<TaskShared<Y>>,
}

/// The worker's half, publishing the outcome exactly once.
///
/// Dropped without publishing (the executor discarded the job), it records
/// a rejection so waiters are released.
pub(crate) struct TaskCompletion<Y> {
    shared: Option<Arc<TaskShared<Y>>>,
}

impl<Y> TaskHandle<Y> {
    /// Creates a running task and its worker-side completion.
    pub(crate) fn pair() -> (Self, TaskCompletion<Y>) {
        let shared = Arc::new(TaskShared {
            id: Uuid::new_v4(),
            token: Arc::new(CancellationToken::new()),
            slot: Mutex::new(TaskSlot {
                state: TaskState::Running,
                outcome: None,
            }),
            done: Condvar::new(),
        });
        let completion = TaskCompletion {
            shared: Some(Arc::clone(&shared)),
        };
        (Self { shared }, completion)
    }

    /// Returns the task's unique id.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    /// Returns the token the background function runs under.
    #[must_use]
    pub fn token(&self) -> &Arc<CancellationToken> {
        &self.shared.token
    }

    /// Returns the current state.
    ///
    /// A running task whose cancellation was requested reports `Cancelled`.
    #[must_use]
    pub fn state(&self) -> TaskState {
        let state = self.shared.slot.lock().state;
        if state == TaskState::Running && self.shared.token.is_cancelled() {
            TaskState::Cancelled
        } else {
            state
        }
    }

    /// Returns true once the background function has returned.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.shared.slot.lock().state.is_terminal()
    }

    /// Requests cooperative cancellation.
    ///
    /// Returns false if the function had already finished.
    pub fn cancel(&self) -> bool {
        let slot = self.shared.slot.lock();
        if slot.state.is_terminal() {
            return false;
        }
        drop(slot);
        self.shared.token.cancel(format!("task {} cancelled", self.shared.id));
        true
    }

    /// Blocks until the function finishes and returns its outcome.
    ///
    /// Fails with [`FuncError::Interrupted`] if the task was cancelled or
    /// the waiting thread's own token is cancelled meanwhile.
    pub fn wait(self) -> Result<Y> {
        self.wait_until(None)
    }

    /// Blocks at most `deadline` for the outcome.
    ///
    /// On expiry the task is cancelled and [`FuncError::Timeout`] returned;
    /// the background thread is not waited for.
    pub fn join_within(self, deadline: Duration) -> Result<Y> {
        match Instant::now().checked_add(deadline) {
            Some(expires) => self.wait_until(Some((expires, deadline))),
            None => self.wait(),
        }
    }

    fn wait_until(self, expiry: Option<(Instant, Duration)>) -> Result<Y> {
        let caller = cancellation::current();
        let mut slot = self.shared.slot.lock();

        while !slot.state.is_terminal() {
            let now = Instant::now();
            let mut slice = CALLER_POLL;
            if let Some((expires, deadline)) = expiry {
                if now >= expires {
                    drop(slot);
                    self.cancel();
                    return Err(FuncError::timeout(deadline));
                }
                slice = slice.min(expires - now);
            }

            self.shared.done.wait_for(&mut slot, slice);

            if !slot.state.is_terminal() && caller.is_cancelled() {
                drop(slot);
                self.cancel();
                return Err(caller
                    .check()
                    .err()
                    .unwrap_or_else(|| FuncError::interrupted("caller cancelled")));
            }
        }

        match slot.state {
            TaskState::Cancelled => Err(FuncError::interrupted(
                self.shared
                    .token
                    .reason()
                    .unwrap_or_else(|| "task cancelled".to_string()),
            )),
            _ => slot.outcome.take().unwrap_or_else(|| {
                Err(FuncError::Rejected("task outcome already taken".to_string()))
            }),
        }
    }
}

impl<Y> std::fmt::Debug for TaskHandle<Y> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id())
            .field("state", &self.state())
            .finish()
    }
}

impl<Y> TaskCompletion<Y> {
    /// Publishes the outcome and wakes waiters.
    ///
    /// A cancelled task discards the outcome and ends `Cancelled`.
    pub(crate) fn complete(mut self, outcome: Result<Y>) {
        if let Some(shared) = self.shared.take() {
            Self::publish(&shared, outcome);
        }
    }

    fn publish(shared: &TaskShared<Y>, outcome: Result<Y>) {
        let mut slot = shared.slot.lock();
        if shared.token.is_cancelled() {
            slot.state = TaskState::Cancelled;
        } else {
            slot.state = if outcome.is_ok() {
                TaskState::Completed
            } else {
                TaskState::Failed
            };
            slot.outcome = Some(outcome);
        }
        drop(slot);
        shared.done.notify_all();
    }
}

impl<Y> Drop for TaskCompletion<Y> {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            Self::publish(
                &shared,
                Err(FuncError::Rejected("task dropped before running".to_string())),
            );
        }
    }
}
