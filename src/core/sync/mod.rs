/*!
 * Synchronization Policies
 *
 * Thread-safety strategies injected into signals and slot owners at
 * construction:
 * - Single threaded: no policy-level serialisation
 * - Multi threaded local: one mutex per signal and per slot owner
 * - Multi threaded global: every registry operation also enters one
 *   process-wide reentrant lock
 *
 * # Lock Order
 *
 * The only nested acquisition is signal registry -> slot owner
 * back-reference set. Slot owners never call into a signal while holding
 * their own lock, and no lock is held while callbacks run.
 */

mod config;
mod policy;

pub use config::{SigslotConfig, ThreadPolicy};
pub use policy::{PolicyGuard, PolicyLock};
