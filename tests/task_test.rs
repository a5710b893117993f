/*!
 * Task Tests
 * Suspension on signals, joins, failure reporting and teardown
 */

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use sigslot::{Signal, Slots, Task, TaskError, TaskFailure, TaskStatus};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn test_task_resumes_with_emitted_value() {
    let signal: Signal<bool> = Signal::new();
    let waiting = signal.wait();
    let task = Task::named("observer", async move { Ok(waiting.await) });

    task.start().unwrap();
    assert_eq!(task.status(), TaskStatus::Running);
    assert_eq!(signal.waiter_count(), 1);

    signal.emit(true);
    assert_eq!(task.status(), TaskStatus::Completed);
    assert!(task.get().unwrap());
    assert_eq!(signal.waiter_count(), 0);
}

#[test]
fn test_tick_tock() {
    let tick: Arc<Signal<()>> = Arc::new(Signal::new());
    let tock: Arc<Signal<i32>> = Arc::new(Signal::new());
    let steps = Arc::new(Mutex::new(Vec::new()));

    let task = {
        let tick = Arc::clone(&tick);
        let tock = Arc::clone(&tock);
        let steps = Arc::clone(&steps);
        Task::new(async move {
            steps.lock().push("waiting for tick");
            tick.wait().await;
            steps.lock().push("waiting for tock");
            let value = tock.wait().await;
            steps.lock().push("done");
            Ok(value)
        })
    };

    // Nobody awaits tock yet: this emission is lost
    tock.emit(1);
    task.start().unwrap();
    assert_eq!(*steps.lock(), vec!["waiting for tick"]);

    tock.emit(2);
    assert!(task.running());

    tick.emit(());
    assert_eq!(*steps.lock(), vec!["waiting for tick", "waiting for tock"]);

    tock.emit(42);
    assert_eq!(task.get().unwrap(), 42);
    assert_eq!(steps.lock().len(), 3);
}

#[test]
fn test_emit_resumes_only_current_waiters() {
    let signal: Arc<Signal<()>> = Arc::new(Signal::new());
    let resumed = Arc::new(AtomicUsize::new(0));

    let spawn = |label: &'static str| {
        let signal = Arc::clone(&signal);
        let resumed = Arc::clone(&resumed);
        let task = Task::named(label, async move {
            signal.wait().await;
            resumed.fetch_add(1, Ordering::SeqCst);
            // Re-arm: must not be resumed by the emission that woke us
            signal.wait().await;
            Ok(())
        });
        task.start().unwrap();
        task
    };

    let early: Vec<Task<()>> = (0..3).map(|_| spawn("early")).collect();
    signal.emit(());
    assert_eq!(resumed.load(Ordering::SeqCst), 3);
    assert_eq!(signal.waiter_count(), 3);

    let late = spawn("late");
    assert_eq!(resumed.load(Ordering::SeqCst), 3);
    assert!(early.iter().all(Task::running));
    assert!(late.running());

    signal.emit(());
    assert!(early.iter().all(Task::is_finished));
    assert_eq!(resumed.load(Ordering::SeqCst), 4);
    assert!(late.running());
}

#[test]
fn test_waiters_resume_in_registration_order() {
    let signal: Arc<Signal<u8>> = Arc::new(Signal::new());
    let order = Arc::new(Mutex::new(Vec::new()));

    let tasks: Vec<Task<()>> = (0..6)
        .map(|index| {
            let waiting = signal.wait();
            let order = Arc::clone(&order);
            let task = Task::new(async move {
                let value = waiting.await;
                order.lock().push((index, value));
                Ok(())
            });
            task.start().unwrap();
            task
        })
        .collect();

    signal.emit(9);
    assert!(tasks.iter().all(Task::is_finished));
    let expected: Vec<(usize, u8)> = (0..6).map(|index| (index, 9)).collect();
    assert_eq!(*order.lock(), expected);
}

#[test]
fn test_task_awaits_task() {
    let go: Arc<Signal<()>> = Arc::new(Signal::new());
    let producer = {
        let go = Arc::clone(&go);
        Task::named("producer", async move {
            go.wait().await;
            Ok(7)
        })
    };

    let joined = producer.join();
    let consumer = Task::named("consumer", async move { Ok(joined.await? * 10) });

    consumer.start().unwrap();
    assert!(consumer.running());

    producer.start().unwrap();
    assert!(consumer.running());

    go.emit(());
    assert_eq!(producer.get().unwrap(), 7);
    assert_eq!(consumer.get().unwrap(), 70);
}

#[test]
fn test_join_completed_task_does_not_suspend() {
    let inner = Task::new(async { Ok("ready") });
    inner.start().unwrap();

    let joined = inner.join();
    let outer = Task::new(async move { Ok(joined.await?.len()) });
    outer.start().unwrap();
    assert_eq!(outer.get().unwrap(), 5);
}

#[derive(Debug, thiserror::Error)]
#[error("sensor offline")]
struct SensorOffline;

#[test]
fn test_failure_reported_once() {
    let trigger: Arc<Signal<()>> = Arc::new(Signal::new());
    let task: Task<u32> = {
        let trigger = Arc::clone(&trigger);
        Task::named("sensor", async move {
            trigger.wait().await;
            Err(SensorOffline.into())
        })
    };

    let owner = Slots::new();
    let completions = Arc::new(AtomicUsize::new(0));
    let failures: Arc<Mutex<Vec<TaskFailure>>> = Arc::new(Mutex::new(Vec::new()));
    {
        let completions = Arc::clone(&completions);
        task.complete().connect(&owner, move |_| {
            completions.fetch_add(1, Ordering::SeqCst);
        });
        let failures = Arc::clone(&failures);
        task.failed().connect(&owner, move |failure| failures.lock().push(failure));
    }

    task.start().unwrap();
    trigger.emit(());
    trigger.emit(());

    assert_eq!(task.status(), TaskStatus::Failed);
    assert_eq!(completions.load(Ordering::SeqCst), 0);
    let failures = failures.lock();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].downcast_ref::<SensorOffline>().is_some());

    match task.get() {
        Err(TaskError::Failed(failure)) => {
            assert!(failure.ptr_eq(&failures[0]));
            assert_eq!(failure.to_string(), "sensor offline");
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

fn explode() -> anyhow::Result<()> {
    panic!("boom")
}

#[test]
fn test_panicking_body_fails_task() {
    let task: Task<()> = Task::new(async { explode() });
    let seen = Arc::new(Mutex::new(None));
    let owner = Slots::new();
    {
        let seen = Arc::clone(&seen);
        task.failed()
            .connect(&owner, move |failure: TaskFailure| *seen.lock() = Some(failure.to_string()));
    }

    task.start().unwrap();
    assert_eq!(task.status(), TaskStatus::Failed);
    assert_eq!(seen.lock().as_deref(), Some("task panicked: boom"));
    assert!(task.get().unwrap_err().failure().is_some());
}

#[test]
fn test_join_reports_failure() {
    let failing: Task<u8> = Task::new(async { Err(anyhow::anyhow!("no data")) });
    let joined = failing.join();
    let watcher = Task::new(async move {
        Ok(match joined.await {
            Ok(_) => "value".to_string(),
            Err(error) => error.to_string(),
        })
    });

    watcher.start().unwrap();
    failing.start().unwrap();
    assert_eq!(watcher.get().unwrap(), "Task failed: no data");
}

#[test]
fn test_dropping_suspended_task_releases_awaiter() {
    let signal: Signal<u8> = Signal::new();
    let waiting = signal.wait();
    let task = Task::new(async move { Ok(waiting.await) });
    task.start().unwrap();
    assert_eq!(signal.waiter_count(), 1);

    let joined = task.join();
    let watcher = Task::new(async move { Ok(matches!(joined.await, Err(TaskError::NoTask))) });
    watcher.start().unwrap();

    drop(task);
    assert_eq!(signal.waiter_count(), 0);
    assert!(watcher.get().unwrap());

    // Nothing left to resume
    signal.emit(1);
}

#[test]
fn test_task_on_dropped_signal_never_resumes() {
    let signal: Signal<u8> = Signal::new();
    let waiting = signal.wait();
    let task = Task::new(async move { Ok(waiting.await) });
    task.start().unwrap();

    drop(signal);
    assert!(task.running());
    assert!(matches!(task.get(), Err(TaskError::NotFinished(_))));
}
