/*!
 * Slot Owners
 * Receiver-side back-reference bookkeeping with disconnect-on-drop
 */

use super::traits::SignalLink;
use crate::core::id::{OwnerId, SignalId};
use crate::core::sync::{PolicyLock, ThreadPolicy};
use ahash::RandomState;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

/// Anything usable as a connection target
///
/// Embed a [`Slots`] in the receiver and return it here. Every connection
/// targeting the receiver is removed when that `Slots` is dropped.
pub trait HasSlots {
    fn slots(&self) -> &Slots;
}

/// Back-reference set of one slot owner
struct SourceSet {
    sources: HashMap<SignalId, Weak<dyn SignalLink>, RandomState>,
    /// Set once teardown begins; no signal may register afterwards
    closed: bool,
}

/// Shared part of a slot owner, referenced weakly by connections
pub(crate) struct OwnerInner {
    id: OwnerId,
    lock: PolicyLock,
    state: Mutex<SourceSet>,
}

impl OwnerInner {
    pub fn new(lock: PolicyLock) -> Self {
        Self {
            id: OwnerId::next(),
            lock,
            state: Mutex::new(SourceSet {
                sources: HashMap::with_hasher(RandomState::new()),
                closed: false,
            }),
        }
    }

    #[inline]
    pub fn id(&self) -> OwnerId {
        self.id
    }

    /// Record that `signal` holds a connection targeting this owner
    ///
    /// Returns false once the owner is being torn down.
    pub fn register_source(&self, signal: SignalId, link: Weak<dyn SignalLink>) -> bool {
        let _policy = self.lock.enter();
        let mut state = self.state.lock();
        if state.closed {
            trace!(owner = %self.id, signal = %signal, "Refused registration on closed owner");
            return false;
        }
        state.sources.insert(signal, link);
        true
    }

    /// Forget `signal`; it no longer holds connections targeting this owner
    pub fn unregister_source(&self, signal: SignalId) {
        let _policy = self.lock.enter();
        self.state.lock().sources.remove(&signal);
    }

    pub fn source_count(&self) -> usize {
        self.state.lock().sources.len()
    }

    pub fn is_source(&self, signal: SignalId) -> bool {
        self.state.lock().sources.contains_key(&signal)
    }

    /// Copy of the back-reference set, optionally closing the owner
    ///
    /// The owner lock is released before the caller visits any signal.
    fn snapshot_sources(&self, close: bool) -> Vec<Weak<dyn SignalLink>> {
        let _policy = self.lock.enter();
        let mut state = self.state.lock();
        if close {
            state.closed = true;
        }
        state.sources.values().cloned().collect()
    }

    /// Copy every connection targeting `source` onto this owner
    ///
    /// Each source signal is visited with no owner lock held, the same order
    /// `attach` uses (signal registry, then owner).
    fn duplicate_from(self: &Arc<Self>, source: &OwnerInner) -> usize {
        let mut copied = 0;
        for link in source.snapshot_sources(false) {
            if let Some(signal) = link.upgrade() {
                copied += signal.slot_duplicate(source.id, self, Weak::clone(&link));
            }
        }
        copied
    }

    /// Ask every referenced signal to drop its connections to this owner
    fn notify_sources(&self, close: bool) -> usize {
        let sources = self.snapshot_sources(close);
        let mut removed = 0;
        for link in sources {
            if let Some(signal) = link.upgrade() {
                trace!(owner = %self.id, signal = %signal.signal_id(), "Notifying signal");
                removed += signal.slot_disconnect(self);
            }
        }

        // Signals dropped concurrently may have left stale entries behind
        let _policy = self.lock.enter();
        let mut state = self.state.lock();
        state.sources.retain(|_, link| link.strong_count() > 0);
        if close {
            state.sources.clear();
        }
        removed
    }
}

/// Slot-owner capability
///
/// # Example
///
/// ```
/// use sigslot::{HasSlots, Signal, Slots};
///
/// struct Sink {
///     slots: Slots,
/// }
///
/// impl HasSlots for Sink {
///     fn slots(&self) -> &Slots {
///         &self.slots
///     }
/// }
///
/// let clicked: Signal<bool> = Signal::new();
/// {
///     let sink = Sink { slots: Slots::new() };
///     clicked.connect(&sink, |on| println!("clicked {on}"));
///     clicked.emit(true);
/// }
/// // `sink` is gone and so is its connection
/// assert_eq!(clicked.connection_count(), 0);
/// ```
pub struct Slots {
    inner: Arc<OwnerInner>,
}

impl Slots {
    pub fn new() -> Self {
        Self::with_policy(ThreadPolicy::current_default())
    }

    pub fn with_policy(policy: ThreadPolicy) -> Self {
        Self {
            inner: Arc::new(OwnerInner::new(PolicyLock::new(policy))),
        }
    }

    pub fn id(&self) -> OwnerId {
        self.inner.id
    }

    pub fn policy(&self) -> ThreadPolicy {
        self.inner.lock.policy()
    }

    /// Number of distinct signals holding connections to this owner
    pub fn source_count(&self) -> usize {
        self.inner.source_count()
    }

    /// Whether the signal with `id` holds a connection to this owner
    pub fn is_connected_to(&self, id: SignalId) -> bool {
        self.inner.is_source(id)
    }

    /// Disconnect from every signal while keeping the owner usable
    ///
    /// Returns the number of connections removed.
    pub fn disconnect_all(&self) -> usize {
        let removed = self.inner.notify_sources(false);
        debug!(owner = %self.inner.id, removed, "Disconnected slot owner from all signals");
        removed
    }

    /// Copy every connection targeting `source` onto this owner
    ///
    /// Each signal connected to `source` gains one connection per copied one,
    /// sharing the callable and one-shot flag. Returns the number copied.
    pub fn duplicate_from(&self, source: &Slots) -> usize {
        if source.id() == self.id() {
            return 0;
        }
        let copied = self.inner.duplicate_from(&source.inner);
        debug!(from = %source.id(), to = %self.inner.id, copied, "Duplicated slot owner connections");
        copied
    }

    pub(crate) fn inner(&self) -> &Arc<OwnerInner> {
        &self.inner
    }
}

impl Default for Slots {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Slots {
    /// Copy construction: a new owner connected wherever this one is
    fn clone(&self) -> Self {
        let copy = Slots::with_policy(self.policy());
        copy.duplicate_from(self);
        copy
    }
}

impl HasSlots for Slots {
    fn slots(&self) -> &Slots {
        self
    }
}

impl fmt::Debug for Slots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slots")
            .field("id", &self.inner.id)
            .field("policy", &self.policy())
            .field("sources", &self.source_count())
            .finish()
    }
}

impl Drop for Slots {
    /// Notify every signal first, release the back-reference set last
    fn drop(&mut self) {
        let removed = self.inner.notify_sources(true);
        if removed > 0 {
            debug!(owner = %self.inner.id, removed, "Slot owner dropped, connections removed");
        }
    }
}
