/*!
 * Awaiter Bridge
 * Suspends a cooperative task until a signal's next emission
 *
 * `signal.wait()` registers an [`Awaiter`] immediately (edge triggered).
 * The next `emit` detaches every registered waiter as one batch, stores the
 * payload and wakes the task, which the task's waker re-polls in place on
 * the emitting thread. [`Latch`] is the explicit level-triggered variant.
 */

mod latch;
mod waiter;
mod wait;

pub use latch::{Latch, LatchWait};
pub use wait::Awaiter;

pub(crate) use waiter::WaiterSlot;
