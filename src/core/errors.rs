/*!
 * Error Types
 * Task usage faults and captured task failures, with thiserror and miette diagnostics
 */

use miette::Diagnostic;
use std::any::Any;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Task operation result
pub type TaskResult<T> = Result<T, TaskError>;

/// Task errors
///
/// Everything except `Failed` is a usage fault raised synchronously at the call site.
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum TaskError {
    #[error("No task to start")]
    #[diagnostic(
        code(task::no_task),
        help("The handle is empty or its frame was destroyed. Build it with Task::new.")
    )]
    NoTask,

    #[error("Task '{0}' already started")]
    #[diagnostic(
        code(task::already_started),
        help("A task runs once. Await it or read its outcome instead of starting it again.")
    )]
    AlreadyStarted(String),

    #[error("Task '{0}' already finished")]
    #[diagnostic(
        code(task::already_finished),
        help("The task has run to completion. Read its outcome with get().")
    )]
    AlreadyFinished(String),

    #[error("Task '{0}' has not finished")]
    #[diagnostic(
        code(task::not_finished),
        help("Await the task or connect to its completion signal before reading the result.")
    )]
    NotFinished(String),

    #[error("Task failed: {0}")]
    #[diagnostic(code(task::failed))]
    Failed(#[from] TaskFailure),
}

impl TaskError {
    /// The captured body failure, if this is one
    pub fn failure(&self) -> Option<&TaskFailure> {
        match self {
            TaskError::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Failure captured from a task body
///
/// Shared so the same error can be carried by the failure signal, every
/// `get()` call and every joiner.
#[derive(Clone)]
pub struct TaskFailure(Arc<anyhow::Error>);

impl TaskFailure {
    pub fn new(error: anyhow::Error) -> Self {
        Self(Arc::new(error))
    }

    /// Convert a caught panic payload into a failure
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "opaque panic payload".to_string()
        };
        Self::new(anyhow::anyhow!("task panicked: {}", message))
    }

    /// The underlying error
    pub fn error(&self) -> &anyhow::Error {
        &self.0
    }

    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        self.0.downcast_ref::<E>()
    }

    /// True if both handles carry the very same captured error
    pub fn ptr_eq(&self, other: &TaskFailure) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl fmt::Debug for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl StdError for TaskFailure {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl From<anyhow::Error> for TaskFailure {
    fn from(error: anyhow::Error) -> Self {
        Self::new(error)
    }
}
