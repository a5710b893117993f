/*!
 * Concurrency Tests
 * Connect, disconnect, emit and owner teardown racing across threads
 */

use pretty_assertions::assert_eq;
use serial_test::serial;
use sigslot::{Signal, SigslotConfig, Slots, Task, ThreadPolicy};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

const THREADS: usize = 8;
const ROUNDS: usize = 200;

fn churn(policy: ThreadPolicy) {
    let signal: Arc<Signal<usize>> = Arc::new(Signal::with_policy(policy));
    let anchor = Slots::with_policy(policy);
    let anchor_hits = Arc::new(AtomicUsize::new(0));
    {
        let hits = Arc::clone(&anchor_hits);
        signal.connect(&anchor, move |_| {
            hits.fetch_add(1, Ordering::Relaxed);
        });
    }

    let barrier = Arc::new(Barrier::new(THREADS + 1));
    let mut handles = Vec::new();
    for worker in 0..THREADS {
        let signal = Arc::clone(&signal);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            for round in 0..ROUNDS {
                let owner = Slots::with_policy(policy);
                signal.connect(&owner, |_| {});
                signal.connect_once(&owner, |_| {});
                signal.emit(worker * ROUNDS + round);
                if round % 3 == 0 {
                    signal.disconnect(&owner);
                    assert_eq!(owner.source_count(), 0);
                }
                // Owner drop races with other threads' emits
            }
        }));
    }

    barrier.wait();
    for _ in 0..ROUNDS {
        signal.emit(0);
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(signal.connection_count(), 1);
    assert_eq!(anchor.source_count(), 1);
    assert_eq!(
        anchor_hits.load(Ordering::Relaxed),
        THREADS * ROUNDS + ROUNDS
    );
}

#[test]
fn test_churn_local_policy() {
    churn(ThreadPolicy::MultiThreadedLocal);
}

#[test]
#[serial]
fn test_churn_global_policy() {
    churn(ThreadPolicy::MultiThreadedGlobal);
}

#[test]
fn test_signals_dropped_while_owner_tears_down() {
    for _ in 0..50 {
        let owner = Arc::new(Slots::new());
        let signals: Vec<Signal<()>> = (0..16).map(|_| Signal::new()).collect();
        for signal in &signals {
            signal.connect(owner.as_ref(), |_| {});
        }

        let dropper = thread::spawn(move || drop(signals));
        let owner_ref = Arc::clone(&owner);
        let disconnector = thread::spawn(move || owner_ref.disconnect_all());

        dropper.join().unwrap();
        disconnector.join().unwrap();
        assert_eq!(owner.source_count(), 0);
    }
}

#[test]
fn test_tasks_resumed_from_emitting_threads() {
    let signal: Arc<Signal<usize>> = Arc::new(Signal::new());
    let total = Arc::new(AtomicUsize::new(0));

    let tasks: Vec<Task<()>> = (0..THREADS)
        .map(|_| {
            let signal = Arc::clone(&signal);
            let total = Arc::clone(&total);
            let task = Task::new(async move {
                for _ in 0..3 {
                    let value = signal.wait().await;
                    total.fetch_add(value, Ordering::SeqCst);
                }
                Ok(())
            });
            task.start().unwrap();
            task
        })
        .collect();

    for value in 1..=3 {
        let signal = Arc::clone(&signal);
        thread::spawn(move || signal.emit(value)).join().unwrap();
    }

    assert!(tasks.iter().all(Task::is_finished));
    assert_eq!(total.load(Ordering::SeqCst), THREADS * 6);
}

#[test]
#[serial]
fn test_installed_config_sets_default_policy() {
    SigslotConfig::global_lock().install();
    let signal: Signal<()> = Signal::new();
    let owner = Slots::new();
    SigslotConfig::default().install();

    assert_eq!(signal.policy(), ThreadPolicy::MultiThreadedGlobal);
    assert_eq!(owner.policy(), ThreadPolicy::MultiThreadedGlobal);
    assert_eq!(Signal::<()>::new().policy(), ThreadPolicy::compiled_default());
}

#[test]
#[serial]
fn test_policy_from_env() {
    std::env::set_var("SIGSLOT_POLICY", "mtg");
    assert_eq!(SigslotConfig::from_env().default_policy, ThreadPolicy::MultiThreadedGlobal);
    std::env::set_var("SIGSLOT_POLICY", "bogus");
    assert_eq!(SigslotConfig::from_env(), SigslotConfig::default());
    std::env::remove_var("SIGSLOT_POLICY");
}
