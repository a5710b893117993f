/*!
 * Connections
 * One (target, callable, one-shot) entry in a signal's registry
 */

use super::slots::OwnerInner;
use crate::core::id::OwnerId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Slot callable type
pub type Callback<A> = Arc<dyn Fn(A) + Send + Sync>;

/// Registered connection
///
/// Owned by exactly one signal's registry. Emit snapshots hold extra `Arc`s,
/// so removal from the registry alone does not stop an in-flight pass; the
/// `expired` flag does.
pub(crate) struct Connection<A> {
    owner: OwnerId,
    target: Weak<OwnerInner>,
    callback: Callback<A>,
    one_shot: bool,
    expired: AtomicBool,
}

impl<A> Connection<A> {
    pub fn new(target: &Arc<OwnerInner>, callback: Callback<A>, one_shot: bool) -> Self {
        Self {
            owner: target.id(),
            target: Arc::downgrade(target),
            callback,
            one_shot,
            expired: AtomicBool::new(false),
        }
    }

    /// Same target and callable, fresh lifecycle (copy construction)
    pub fn duplicate(&self) -> Self {
        Self {
            owner: self.owner,
            target: Weak::clone(&self.target),
            callback: Arc::clone(&self.callback),
            one_shot: self.one_shot,
            expired: AtomicBool::new(false),
        }
    }

    /// Same callable and one-shot flag, delivered to another owner
    pub fn retarget(&self, target: &Arc<OwnerInner>) -> Self {
        Self {
            owner: target.id(),
            target: Arc::downgrade(target),
            callback: Arc::clone(&self.callback),
            one_shot: self.one_shot,
            expired: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    #[inline]
    pub fn target(&self) -> Option<Arc<OwnerInner>> {
        self.target.upgrade()
    }

    #[inline]
    pub fn is_expired(&self) -> bool {
        self.expired.load(Ordering::Acquire)
    }

    /// Stop any further delivery, including from in-flight snapshots
    #[inline]
    pub fn expire(&self) {
        self.expired.store(true, Ordering::Release);
    }

    /// Deliver `args` unless expired
    ///
    /// A one-shot connection claims its single delivery atomically, so two
    /// concurrent emits cannot both fire it.
    pub fn fire(&self, args: A) -> bool {
        if self.one_shot {
            if self
                .expired
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                return false;
            }
        } else if self.is_expired() {
            return false;
        }
        (self.callback)(args);
        true
    }
}
