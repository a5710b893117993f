/*!
 * Task Join
 * Future resolving with another task's outcome
 */

use super::runner::TaskCore;
use crate::core::errors::TaskResult;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Await-expression over a [`crate::Task`]
///
/// Output is the joined task's value, `TaskError::Failed` with its failure,
/// or `TaskError::NoTask` if it is empty or was destroyed unfinished.
#[must_use = "a join does nothing unless awaited"]
pub struct Join<T: Clone + Send + 'static> {
    core: Arc<TaskCore<T>>,
}

impl<T: Clone + Send + 'static> Join<T> {
    pub(crate) fn new(core: Arc<TaskCore<T>>) -> Self {
        Self { core }
    }
}

impl<T: Clone + Send + 'static> Future for Join<T> {
    type Output = TaskResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<TaskResult<T>> {
        if let Some(outcome) = self.core.outcome() {
            return Poll::Ready(outcome);
        }
        self.core.add_joiner(cx.waker());
        // The task may have finished between the check and the registration
        match self.core.outcome() {
            Some(outcome) => Poll::Ready(outcome),
            None => Poll::Pending,
        }
    }
}

impl<T: Clone + Send + 'static> fmt::Debug for Join<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Join")
            .field("task", &self.core.id())
            .field("status", &self.core.status())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::core::errors::TaskError;
    use crate::task::Task;
    use futures::task::noop_waker;
    use std::future::Future;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    #[test]
    fn test_join_finished_task_is_immediate() {
        let task = Task::new(async { Ok(9_u8) });
        task.start().unwrap();

        let mut join = task.join();
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);
        assert!(matches!(Pin::new(&mut join).poll(&mut cx), Poll::Ready(Ok(9))));
    }

    #[test]
    fn test_join_destroyed_task() {
        let task = Task::new(async { Ok(1_u8) });
        let mut join = task.join();
        drop(task);

        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);
        assert!(matches!(
            Pin::new(&mut join).poll(&mut cx),
            Poll::Ready(Err(TaskError::NoTask))
        ));
    }

    #[test]
    fn test_join_pending_until_started() {
        let task = Task::new(async { Ok("done") });
        let mut join = task.join();
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);

        assert!(Pin::new(&mut join).poll(&mut cx).is_pending());
        task.start().unwrap();
        assert!(matches!(Pin::new(&mut join).poll(&mut cx), Poll::Ready(Ok("done"))));
    }
}
