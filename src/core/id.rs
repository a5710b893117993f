/*!
 * ID Generation System
 * Process-unique identities used as non-owning relation handles
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

// ============================================================================
// Type-Safe ID Wrappers
// ============================================================================

/// Signal identity, keys a slot owner's back-reference set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalId(pub u64);

/// Slot owner identity, the target of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub u64);

/// Awaiter registration in a signal's waiter set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WaiterId(pub u64);

/// Task identity (diagnostics only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sig-{}", self.0)
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "owner-{}", self.0)
    }
}

impl fmt::Display for WaiterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "waiter-{}", self.0)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

impl From<u64> for SignalId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<u64> for OwnerId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<u64> for WaiterId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<u64> for TaskId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

// ============================================================================
// ID Generator
// ============================================================================

/// Generic ID generator interface
pub trait IdGenerator<T> {
    /// Generate next ID
    fn next(&self) -> T;

    /// Get current counter value (for debugging)
    fn current(&self) -> T;
}

/// Lock-free monotonic counter
///
/// IDs are never recycled, so a stale handle can never alias a newer object.
pub struct AtomicGenerator<T> {
    counter: AtomicU64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> AtomicGenerator<T> {
    /// Create new generator starting at given value
    #[inline]
    pub const fn new(start: u64) -> Self {
        Self {
            counter: AtomicU64::new(start),
            _marker: PhantomData,
        }
    }
}

impl<T: From<u64>> IdGenerator<T> for AtomicGenerator<T> {
    #[inline]
    fn next(&self) -> T {
        T::from(self.counter.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    fn current(&self) -> T {
        T::from(self.counter.load(Ordering::Relaxed))
    }
}

static SIGNAL_IDS: AtomicGenerator<SignalId> = AtomicGenerator::new(1);
static OWNER_IDS: AtomicGenerator<OwnerId> = AtomicGenerator::new(1);
static WAITER_IDS: AtomicGenerator<WaiterId> = AtomicGenerator::new(1);
static TASK_IDS: AtomicGenerator<TaskId> = AtomicGenerator::new(1);

impl SignalId {
    pub(crate) fn next() -> Self {
        SIGNAL_IDS.next()
    }
}

impl OwnerId {
    pub(crate) fn next() -> Self {
        OWNER_IDS.next()
    }
}

impl WaiterId {
    pub(crate) fn next() -> Self {
        WAITER_IDS.next()
    }
}

impl TaskId {
    pub(crate) fn next() -> Self {
        TASK_IDS.next()
    }
}
