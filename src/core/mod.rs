/*!
 * Core Module
 * Identities, error types and thread policies shared by signals and tasks
 */

pub mod errors;
pub mod id;
pub mod sync;

// Re-export for convenience
pub use errors::*;
pub use id::{OwnerId, SignalId, TaskId, WaiterId};
pub use sync::{PolicyGuard, PolicyLock, SigslotConfig, ThreadPolicy};
