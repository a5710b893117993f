/*!
 * sigslot
 * Signal/slot dispatch with reciprocal lifecycle cleanup and a cooperative task bridge
 *
 * - Signals broadcast a payload to every connected slot owner in connection order
 * - Slot owners disconnect themselves from every signal when dropped
 * - Tasks suspend on `signal.wait().await` and are resumed inline by `emit`
 */

pub mod awaiter;
pub mod core;
pub mod monitoring;
pub mod signals;
pub mod task;

// Re-exports
pub use awaiter::{Awaiter, Latch, LatchWait};
pub use crate::core::errors::{TaskError, TaskFailure, TaskResult};
pub use crate::core::id::{OwnerId, SignalId, TaskId, WaiterId};
pub use crate::core::sync::{PolicyLock, SigslotConfig, ThreadPolicy};
pub use monitoring::init_tracing;
pub use signals::{HasSlots, Signal, SignalStats, Slots};
pub use task::{Join, Task, TaskStatus};
