/*!
 * Task Module
 * Cooperative resumable computations driven inline by signal emission
 *
 * A [`Task`] wraps a future. `start()` polls it once on the calling thread.
 * From then on the task runs only when something wakes it: an emitting
 * signal it awaits, or a task it joins finishing. The waker re-polls the
 * future immediately on the waking thread, so there is no executor and no
 * queue.
 */

mod handle;
mod join;
mod runner;
mod types;

pub use handle::Task;
pub use join::Join;
pub use types::TaskStatus;
