/*!
 * Task Types
 * Lifecycle states of a task
 */

use crate::core::errors::TaskFailure;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Observable task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// No body: built with `Task::empty`
    Empty,
    /// Built, not started
    Created,
    /// Started, currently polling or suspended on an await
    Running,
    /// Body returned a value
    Completed,
    /// Body returned an error or panicked
    Failed,
    /// Dropped before finishing; the frame is gone
    Destroyed,
}

impl TaskStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskStatus::Empty => "empty",
            TaskStatus::Created => "created",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}

/// Internal state, carrying the outcome once finished
pub(crate) enum TaskState<T> {
    Empty,
    Created,
    Running,
    Completed(T),
    Failed(TaskFailure),
    Destroyed,
}

impl<T> TaskState<T> {
    pub fn status(&self) -> TaskStatus {
        match self {
            TaskState::Empty => TaskStatus::Empty,
            TaskState::Created => TaskStatus::Created,
            TaskState::Running => TaskStatus::Running,
            TaskState::Completed(_) => TaskStatus::Completed,
            TaskState::Failed(_) => TaskStatus::Failed,
            TaskState::Destroyed => TaskStatus::Destroyed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finished_states() {
        assert!(TaskStatus::Completed.is_finished());
        assert!(TaskStatus::Failed.is_finished());
        assert!(!TaskStatus::Running.is_finished());
        assert!(!TaskStatus::Destroyed.is_finished());
    }

    #[test]
    fn test_state_maps_to_status() {
        let state: TaskState<u8> = TaskState::Completed(1);
        assert_eq!(state.status(), TaskStatus::Completed);
        assert_eq!(TaskState::<u8>::Created.status().to_string(), "created");
    }
}
