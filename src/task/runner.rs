/*!
 * Task Runner
 * Shared task state and the inline poll loop driven by the task's own waker
 */

use super::types::{TaskState, TaskStatus};
use crate::core::errors::{TaskError, TaskFailure, TaskResult};
use crate::core::id::TaskId;
use crate::signals::Signal;
use futures::future::BoxFuture;
use futures::task::{waker, ArcWake};
use parking_lot::Mutex;
use std::mem;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use tracing::{debug, debug_span, trace, warn};

/// Nobody is polling
const IDLE: u8 = 0;
/// A thread is inside `poll`
const POLLING: u8 = 1;
/// Woken while polling; the poller must poll once more
const NOTIFIED: u8 = 2;

/// Boxed task body
pub(crate) type Frame<T> = BoxFuture<'static, anyhow::Result<T>>;

/// Shared part of a task
///
/// Wakers hold `Arc<TaskCore>`; the handle owns the frame's lifetime.
pub(crate) struct TaskCore<T: Clone + Send + 'static> {
    id: TaskId,
    name: Mutex<String>,
    schedule: AtomicU8,
    /// Taken out while polling so the poll runs without any lock held
    frame: Mutex<Option<Frame<T>>>,
    state: Mutex<TaskState<T>>,
    complete: Signal<T>,
    failed: Signal<TaskFailure>,
    joiners: Mutex<Vec<Waker>>,
}

impl<T: Clone + Send + 'static> TaskCore<T> {
    pub fn new(frame: Option<Frame<T>>) -> Self {
        let id = TaskId::next();
        let state = if frame.is_some() {
            TaskState::Created
        } else {
            TaskState::Empty
        };
        Self {
            id,
            name: Mutex::new(id.to_string()),
            schedule: AtomicU8::new(IDLE),
            frame: Mutex::new(frame),
            state: Mutex::new(state),
            complete: Signal::new(),
            failed: Signal::new(),
            joiners: Mutex::new(Vec::new()),
        }
    }

    #[inline]
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn name(&self) -> String {
        self.name.lock().clone()
    }

    pub fn set_name(&self, name: String) {
        *self.name.lock() = name;
    }

    pub fn status(&self) -> TaskStatus {
        self.state.lock().status()
    }

    pub fn complete(&self) -> &Signal<T> {
        &self.complete
    }

    pub fn failed(&self) -> &Signal<TaskFailure> {
        &self.failed
    }

    /// Created -> Running, then run until the first suspension
    pub fn start(self: &Arc<Self>) -> TaskResult<()> {
        let name = self.name();
        {
            let mut state = self.state.lock();
            match *state {
                TaskState::Created => *state = TaskState::Running,
                TaskState::Empty | TaskState::Destroyed => return Err(TaskError::NoTask),
                TaskState::Running => return Err(TaskError::AlreadyStarted(name)),
                TaskState::Completed(_) | TaskState::Failed(_) => {
                    return Err(TaskError::AlreadyFinished(name))
                }
            }
        }
        debug!(task = %self.id, name = %name, "Task started");
        self.schedule();
        Ok(())
    }

    /// Final outcome, or `None` while not finished
    pub fn outcome(&self) -> Option<TaskResult<T>> {
        match &*self.state.lock() {
            TaskState::Completed(value) => Some(Ok(value.clone())),
            TaskState::Failed(failure) => Some(Err(TaskError::Failed(failure.clone()))),
            TaskState::Empty | TaskState::Destroyed => Some(Err(TaskError::NoTask)),
            TaskState::Created | TaskState::Running => None,
        }
    }

    /// Completed value or re-raised failure; a usage fault before that
    pub fn get(&self) -> TaskResult<T> {
        match self.outcome() {
            Some(outcome) => outcome,
            None => Err(TaskError::NotFinished(self.name())),
        }
    }

    pub fn add_joiner(&self, waker: &Waker) {
        let mut joiners = self.joiners.lock();
        if !joiners.iter().any(|joiner| joiner.will_wake(waker)) {
            joiners.push(waker.clone());
        }
    }

    /// Resume request from a waker
    ///
    /// Polls inline unless another poll is in progress, in which case that
    /// poller is told to go round once more.
    fn schedule(self: &Arc<Self>) {
        let mut current = self.schedule.load(Ordering::Acquire);
        loop {
            let next = match current {
                IDLE => POLLING,
                POLLING => NOTIFIED,
                _ => return,
            };
            match self.schedule.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) if next == POLLING => break,
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
        self.run();
    }

    fn run(self: &Arc<Self>) {
        let task_waker = waker(Arc::clone(self));
        let mut cx = Context::from_waker(&task_waker);

        loop {
            let Some(mut frame) = self.frame.lock().take() else {
                // Finished or destroyed: late wake-ups land here
                self.schedule.store(IDLE, Ordering::Release);
                return;
            };

            let span = debug_span!("task", id = %self.id, name = %self.name());
            let polled = {
                let _entered = span.enter();
                catch_unwind(AssertUnwindSafe(|| frame.as_mut().poll(&mut cx)))
            };

            let result = match polled {
                Ok(Poll::Pending) => {
                    self.park(frame);
                    match self.schedule.compare_exchange(
                        POLLING,
                        IDLE,
                        Ordering::AcqRel,
                        Ordering::Acquire,
                    ) {
                        Ok(_) => return,
                        Err(_) => {
                            // Woken during the poll
                            self.schedule.store(POLLING, Ordering::Release);
                            continue;
                        }
                    }
                }
                Ok(Poll::Ready(Ok(value))) => Ok(value),
                Ok(Poll::Ready(Err(error))) => Err(TaskFailure::new(error)),
                Err(panic) => Err(TaskFailure::from_panic(panic)),
            };

            drop(frame);
            self.finish(result);
            self.schedule.store(IDLE, Ordering::Release);
            return;
        }
    }

    /// Put a suspended frame back unless the handle was dropped meanwhile
    fn park(&self, frame: Frame<T>) {
        let mut slot = self.frame.lock();
        if matches!(*self.state.lock(), TaskState::Running) {
            *slot = Some(frame);
            trace!(task = %self.id, "Task suspended");
        } else {
            drop(slot);
            drop(frame);
        }
    }

    fn finish(&self, result: Result<T, TaskFailure>) {
        let name = self.name();
        {
            let mut state = self.state.lock();
            if matches!(*state, TaskState::Destroyed) {
                trace!(task = %self.id, "Destroyed task finished, outcome discarded");
                return;
            }
            *state = match &result {
                Ok(value) => TaskState::Completed(value.clone()),
                Err(failure) => TaskState::Failed(failure.clone()),
            };
        }

        match result {
            Ok(value) => {
                debug!(task = %self.id, name = %name, "Task completed");
                self.complete.emit(value);
            }
            Err(failure) => {
                warn!(task = %self.id, name = %name, error = %failure, "Task failed");
                self.failed.emit(failure);
            }
        }
        self.wake_joiners();
    }

    fn wake_joiners(&self) {
        let joiners = mem::take(&mut *self.joiners.lock());
        for joiner in joiners {
            joiner.wake();
        }
    }

    /// Handle dropped: an unfinished task loses its frame for good
    pub fn invalidate(&self) {
        let finished = {
            let mut state = self.state.lock();
            match *state {
                TaskState::Completed(_) | TaskState::Failed(_) => true,
                _ => {
                    *state = TaskState::Destroyed;
                    false
                }
            }
        };
        let frame = self.frame.lock().take();
        drop(frame);
        if !finished {
            trace!(task = %self.id, "Task destroyed before finishing");
            self.wake_joiners();
        }
    }
}

impl<T: Clone + Send + 'static> ArcWake for TaskCore<T> {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.schedule();
    }
}
