/*!
 * Signal Types
 * Statistics snapshot reported by a signal
 */

use crate::core::id::SignalId;
use crate::core::sync::ThreadPolicy;
use serde::{Deserialize, Serialize};

/// Signal statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalStats {
    pub signal_id: SignalId,
    pub policy: ThreadPolicy,
    pub connections: usize,
    pub waiters: usize,
    pub total_emits: u64,
    pub total_deliveries: u64,
    pub total_waiters_resolved: u64,
    pub total_pruned: u64,
}
