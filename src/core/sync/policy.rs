/*!
 * Policy Lock
 *
 * Pluggable serialisation strategy entered around every registry operation
 */

use super::config::ThreadPolicy;
use parking_lot::{const_reentrant_mutex, ReentrantMutex, ReentrantMutexGuard};
use std::fmt;
use std::thread::{self, ThreadId};

/// Process-wide lock for `MultiThreadedGlobal`
///
/// Reentrant: a callback running under one registry operation may start another.
static GLOBAL_LOCK: ReentrantMutex<()> = const_reentrant_mutex(());

/// Strategy value carried by each signal and slot owner
#[derive(Clone, Copy)]
pub struct PolicyLock {
    policy: ThreadPolicy,
    home: Option<ThreadId>,
}

/// Held for the duration of one registry operation
#[must_use = "the policy section ends when the guard is dropped"]
pub enum PolicyGuard {
    Unlocked,
    Global(ReentrantMutexGuard<'static, ()>),
}

impl PolicyLock {
    pub fn new(policy: ThreadPolicy) -> Self {
        let home = match policy {
            ThreadPolicy::SingleThreaded => Some(thread::current().id()),
            _ => None,
        };
        Self { policy, home }
    }

    #[inline]
    pub fn policy(&self) -> ThreadPolicy {
        self.policy
    }

    /// Enter the policy section
    ///
    /// Single threaded objects are checked for thread affinity in debug builds.
    #[inline]
    pub fn enter(&self) -> PolicyGuard {
        match self.policy {
            ThreadPolicy::SingleThreaded => {
                debug_assert_eq!(
                    self.home,
                    Some(thread::current().id()),
                    "single threaded signal/slot object used from a foreign thread"
                );
                PolicyGuard::Unlocked
            }
            ThreadPolicy::MultiThreadedLocal => PolicyGuard::Unlocked,
            ThreadPolicy::MultiThreadedGlobal => PolicyGuard::Global(GLOBAL_LOCK.lock()),
        }
    }
}

impl Default for PolicyLock {
    fn default() -> Self {
        Self::new(ThreadPolicy::current_default())
    }
}

impl fmt::Debug for PolicyLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyLock")
            .field("policy", &self.policy)
            .finish()
    }
}

impl PolicyGuard {
    pub fn is_global(&self) -> bool {
        matches!(self, PolicyGuard::Global(_))
    }
}
