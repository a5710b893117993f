/*!
 * Lock-Free Signal Statistics
 * Atomic counters updated on the emit path without touching the registry lock
 */

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic emit counters
///
/// # Performance
/// - Cache-line aligned to prevent false sharing with the registry mutex
/// - All operations use relaxed ordering; values are for monitoring only
#[repr(C, align(64))]
pub(crate) struct AtomicSignalStats {
    total_emits: AtomicU64,
    total_deliveries: AtomicU64,
    total_waiters_resolved: AtomicU64,
    total_pruned: AtomicU64,
}

/// Counter values at one instant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct CounterSnapshot {
    pub total_emits: u64,
    pub total_deliveries: u64,
    pub total_waiters_resolved: u64,
    pub total_pruned: u64,
}

impl AtomicSignalStats {
    #[inline]
    pub const fn new() -> Self {
        Self {
            total_emits: AtomicU64::new(0),
            total_deliveries: AtomicU64::new(0),
            total_waiters_resolved: AtomicU64::new(0),
            total_pruned: AtomicU64::new(0),
        }
    }

    /// Hot path - called once per emit
    #[inline(always)]
    pub fn record_emit(&self, deliveries: usize, resolved: usize) {
        self.total_emits.fetch_add(1, Ordering::Relaxed);
        self.total_deliveries
            .fetch_add(deliveries as u64, Ordering::Relaxed);
        self.total_waiters_resolved
            .fetch_add(resolved as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_pruned(&self, count: usize) {
        self.total_pruned.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Values may be mutually inconsistent under concurrent emits,
    /// each one is individually accurate.
    #[inline]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            total_emits: self.total_emits.load(Ordering::Relaxed),
            total_deliveries: self.total_deliveries.load(Ordering::Relaxed),
            total_waiters_resolved: self.total_waiters_resolved.load(Ordering::Relaxed),
            total_pruned: self.total_pruned.load(Ordering::Relaxed),
        }
    }
}

impl Default for AtomicSignalStats {
    fn default() -> Self {
        Self::new()
    }
}
