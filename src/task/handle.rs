/*!
 * Task Handle
 * Owning handle over a cooperative task
 */

use super::join::Join;
use super::runner::{Frame, TaskCore};
use super::types::TaskStatus;
use crate::core::errors::{TaskFailure, TaskResult};
use crate::core::id::TaskId;
use crate::signals::Signal;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Cooperative task
///
/// The body is any `Send` future returning `anyhow::Result<T>`. Returning
/// `Err` or panicking fails the task; the failure is captured, reported once
/// through [`Task::failed`] and re-raised by [`Task::get`].
///
/// The task never runs on its own: [`Task::start`] polls it until its first
/// suspension, and every later step is driven by whoever wakes it. Signals
/// do so from inside `emit`, and finishing tasks do so for their joiners.
///
/// Dropping the handle destroys an unfinished task's frame.
///
/// # Example
///
/// ```
/// use sigslot::{Signal, Task};
/// use std::sync::Arc;
///
/// let tock: Arc<Signal<i32>> = Arc::new(Signal::new());
/// let waiting = tock.wait();
/// let task = Task::new(async move { Ok(waiting.await * 2) });
///
/// task.start().unwrap();
/// assert!(task.running());
/// tock.emit(21);
/// assert_eq!(task.get().unwrap(), 42);
/// ```
pub struct Task<T: Clone + Send + 'static> {
    core: Arc<TaskCore<T>>,
}

impl<T: Clone + Send + 'static> Task<T> {
    pub fn new<F>(body: F) -> Self
    where
        F: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let frame: Frame<T> = Box::pin(body);
        Self {
            core: Arc::new(TaskCore::new(Some(frame))),
        }
    }

    /// Build a task with a diagnostic name
    pub fn named<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let task = Self::new(body);
        task.set_name(name);
        task
    }

    /// A handle with no body; `start` fails with `TaskError::NoTask`
    pub fn empty() -> Self {
        Self {
            core: Arc::new(TaskCore::new(None)),
        }
    }

    pub fn id(&self) -> TaskId {
        self.core.id()
    }

    /// Run until the first suspension
    ///
    /// # Errors
    ///
    /// `NoTask` for an empty task, `AlreadyStarted` if running, and
    /// `AlreadyFinished` once finished.
    pub fn start(&self) -> TaskResult<()> {
        self.core.start()
    }

    /// Started and not yet finished
    pub fn running(&self) -> bool {
        self.core.status() == TaskStatus::Running
    }

    pub fn is_finished(&self) -> bool {
        self.core.status().is_finished()
    }

    pub fn status(&self) -> TaskStatus {
        self.core.status()
    }

    /// Completed value, or the captured failure re-raised
    ///
    /// # Errors
    ///
    /// `NotFinished` before the task finishes, `Failed` after a failure.
    pub fn get(&self) -> TaskResult<T> {
        self.core.get()
    }

    /// Fires once with the result when the body returns successfully
    pub fn complete(&self) -> &Signal<T> {
        self.core.complete()
    }

    /// Fires once with the captured failure when the body fails
    pub fn failed(&self) -> &Signal<TaskFailure> {
        self.core.failed()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        self.core.set_name(name.into());
    }

    pub fn name(&self) -> String {
        self.core.name()
    }

    /// Await-expression over this task
    ///
    /// Resolves immediately if the task has finished, otherwise when it
    /// finishes, fails or is destroyed.
    pub fn join(&self) -> Join<T> {
        Join::new(Arc::clone(&self.core))
    }
}

impl<T: Clone + Send + 'static> Default for Task<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Clone + Send + 'static> Drop for Task<T> {
    fn drop(&mut self) {
        self.core.invalidate();
    }
}

impl<T: Clone + Send + 'static> fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.core.id())
            .field("name", &self.core.name())
            .field("status", &self.core.status())
            .finish()
    }
}
