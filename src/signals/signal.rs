/*!
 * Signal
 * Connection registry, waiter set and the dispatch loop
 */

use super::atomic_stats::AtomicSignalStats;
use super::connection::{Callback, Connection};
use super::slots::{HasSlots, OwnerInner};
use super::traits::SignalLink;
use super::types::SignalStats;
use crate::awaiter::{Awaiter, WaiterSlot};
use crate::core::id::{OwnerId, SignalId, WaiterId};
use crate::core::sync::{PolicyLock, ThreadPolicy};
use parking_lot::Mutex;
use std::fmt;
use std::mem;
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

/// Registry state guarded by the signal's mutex
struct Registry<A> {
    /// Registration order is delivery order
    connections: Vec<Arc<Connection<A>>>,
    /// Registration order is resumption order
    waiters: Vec<Arc<WaiterSlot<A>>>,
}

impl<A> Registry<A> {
    /// Expire and take out every connection targeting `owner`
    ///
    /// The caller drops the returned connections once its locks are released:
    /// a callback may own a `Task` or `Slots` whose teardown calls back in.
    fn remove_owner(&mut self, owner: OwnerId) -> Vec<Arc<Connection<A>>> {
        let (removed, kept): (Vec<_>, Vec<_>) = mem::take(&mut self.connections)
            .into_iter()
            .partition(|conn| conn.owner() == owner);
        self.connections = kept;
        for conn in &removed {
            conn.expire();
        }
        removed
    }

    fn targets(&self, owner: OwnerId) -> bool {
        self.connections.iter().any(|conn| conn.owner() == owner)
    }
}

/// Heap-pinned part of a signal
///
/// Slot owners and awaiters only ever hold `Weak` references to it.
pub(crate) struct SignalInner<A> {
    id: SignalId,
    lock: PolicyLock,
    registry: Mutex<Registry<A>>,
    stats: AtomicSignalStats,
}

impl<A: Clone + Send + 'static> SignalInner<A> {
    fn new(policy: ThreadPolicy) -> Self {
        Self {
            id: SignalId::next(),
            lock: PolicyLock::new(policy),
            registry: Mutex::new(Registry {
                connections: Vec::new(),
                waiters: Vec::new(),
            }),
            stats: AtomicSignalStats::new(),
        }
    }

    pub(crate) fn add_waiter(&self, waiter: Arc<WaiterSlot<A>>) {
        let _policy = self.lock.enter();
        trace!(signal = %self.id, waiter = %waiter.id(), "Waiter registered");
        self.registry.lock().waiters.push(waiter);
    }

    /// Deregister a waiter; false if an emit already detached it
    pub(crate) fn remove_waiter(&self, id: WaiterId) -> bool {
        let removed = {
            let _policy = self.lock.enter();
            let mut registry = self.registry.lock();
            let position = registry.waiters.iter().position(|waiter| waiter.id() == id);
            position.map(|index| registry.waiters.remove(index))
        };
        removed.is_some()
    }

    /// Detach every registered waiter as one batch
    fn take_waiters(&self) -> Vec<Arc<WaiterSlot<A>>> {
        let _policy = self.lock.enter();
        mem::take(&mut self.registry.lock().waiters)
    }

    fn snapshot(&self) -> Vec<Arc<Connection<A>>> {
        let _policy = self.lock.enter();
        self.registry.lock().connections.clone()
    }

    /// Remove expired connections, dropping back-references left without one
    fn prune(&self) -> usize {
        let expired = {
            let _policy = self.lock.enter();
            let mut registry = self.registry.lock();
            let (expired, live): (Vec<_>, Vec<_>) = mem::take(&mut registry.connections)
                .into_iter()
                .partition(|conn| conn.is_expired());
            registry.connections = live;

            for conn in &expired {
                if registry.targets(conn.owner()) {
                    continue;
                }
                if let Some(owner) = conn.target() {
                    owner.unregister_source(self.id);
                }
            }
            expired
        };

        if !expired.is_empty() {
            trace!(signal = %self.id, pruned = expired.len(), "Pruned expired connections");
            self.stats.record_pruned(expired.len());
        }
        expired.len()
    }
}

impl<A: Clone + Send + 'static> SignalLink for SignalInner<A> {
    fn signal_id(&self) -> SignalId {
        self.id
    }

    fn slot_disconnect(&self, owner: &OwnerInner) -> usize {
        let removed = {
            let _policy = self.lock.enter();
            let mut registry = self.registry.lock();
            let removed = registry.remove_owner(owner.id());
            owner.unregister_source(self.id);
            removed
        };
        removed.len()
    }

    fn slot_duplicate(
        &self,
        old: OwnerId,
        new: &Arc<OwnerInner>,
        link: Weak<dyn SignalLink>,
    ) -> usize {
        let _policy = self.lock.enter();
        let mut registry = self.registry.lock();
        let copies: Vec<Arc<Connection<A>>> = registry
            .connections
            .iter()
            .filter(|conn| conn.owner() == old && !conn.is_expired())
            .map(|conn| Arc::new(conn.retarget(new)))
            .collect();
        if copies.is_empty() || !new.register_source(self.id, link) {
            return 0;
        }
        trace!(signal = %self.id, from = %old, to = %new.id(), copied = copies.len(), "Duplicated slot owner");
        let copied = copies.len();
        registry.connections.extend(copies);
        copied
    }
}

/// Typed emitter broadcasting `A` to connected slot owners and suspended tasks
///
/// `A` is the whole payload: `()` for no arguments, the bare value for one,
/// a tuple for several. Every delivery receives its own clone.
///
/// # Dispatch
///
/// `emit` snapshots the registry, then delivers to every connection that is
/// still live, in connection order. Connections made by a callback during an
/// emit are first observed by the next emit. After delivery, the waiters
/// registered at that moment are detached as one batch and resolved in
/// registration order, and suspended tasks resume before `emit` returns.
/// Fired one-shot connections are pruned last.
///
/// # Copy
///
/// `clone` builds a new signal with a copy of every live connection; each
/// target gains one back-reference. Moving a `Signal` is free: peers refer
/// to its heap-pinned registry, never to the handle.
pub struct Signal<A: Clone + Send + 'static> {
    inner: Arc<SignalInner<A>>,
}

impl<A: Clone + Send + 'static> Signal<A> {
    pub fn new() -> Self {
        Self::with_policy(ThreadPolicy::current_default())
    }

    pub fn with_policy(policy: ThreadPolicy) -> Self {
        Self {
            inner: Arc::new(SignalInner::new(policy)),
        }
    }

    pub fn id(&self) -> SignalId {
        self.inner.id
    }

    pub fn policy(&self) -> ThreadPolicy {
        self.inner.lock.policy()
    }

    fn link(&self) -> Weak<dyn SignalLink> {
        let weak: Weak<SignalInner<A>> = Arc::downgrade(&self.inner);
        weak
    }

    pub(crate) fn downgrade(&self) -> Weak<SignalInner<A>> {
        Arc::downgrade(&self.inner)
    }

    /// Connect `slot` to this signal on behalf of `target`
    pub fn connect<T, F>(&self, target: &T, slot: F)
    where
        T: HasSlots + ?Sized,
        F: Fn(A) + Send + Sync + 'static,
    {
        self.connect_with(target, slot, false);
    }

    /// Connect `slot` for exactly one delivery
    pub fn connect_once<T, F>(&self, target: &T, slot: F)
    where
        T: HasSlots + ?Sized,
        F: Fn(A) + Send + Sync + 'static,
    {
        self.connect_with(target, slot, true);
    }

    /// Connect `slot`, auto-disconnecting after its first delivery if `one_shot`
    pub fn connect_with<T, F>(&self, target: &T, slot: F, one_shot: bool)
    where
        T: HasSlots + ?Sized,
        F: Fn(A) + Send + Sync + 'static,
    {
        let callback: Callback<A> = Arc::new(slot);
        self.attach(target.slots().inner(), callback, one_shot);
    }

    /// Connect a method of a shared receiver
    ///
    /// The connection holds the receiver weakly and skips delivery once the
    /// receiver is gone.
    pub fn connect_method<T, M>(&self, target: &Arc<T>, method: M)
    where
        T: HasSlots + Send + Sync + 'static,
        M: Fn(&T, A) + Send + Sync + 'static,
    {
        self.connect_method_with(target, method, false);
    }

    pub fn connect_method_with<T, M>(&self, target: &Arc<T>, method: M, one_shot: bool)
    where
        T: HasSlots + Send + Sync + 'static,
        M: Fn(&T, A) + Send + Sync + 'static,
    {
        let receiver = Arc::downgrade(target);
        self.connect_with(
            target.as_ref(),
            move |args| {
                if let Some(receiver) = receiver.upgrade() {
                    method(&receiver, args);
                }
            },
            one_shot,
        );
    }

    fn attach(&self, owner: &Arc<OwnerInner>, callback: Callback<A>, one_shot: bool) {
        let _policy = self.inner.lock.enter();
        let mut registry = self.inner.registry.lock();
        if !owner.register_source(self.inner.id, self.link()) {
            return;
        }
        registry
            .connections
            .push(Arc::new(Connection::new(owner, callback, one_shot)));
        trace!(
            signal = %self.inner.id,
            owner = %owner.id(),
            one_shot,
            connections = registry.connections.len(),
            "Connected"
        );
    }

    /// Remove every connection targeting `target`
    ///
    /// Returns the number removed; zero is a no-op.
    pub fn disconnect<T: HasSlots + ?Sized>(&self, target: &T) -> usize {
        let owner = target.slots().inner();
        let removed = {
            let _policy = self.inner.lock.enter();
            let mut registry = self.inner.registry.lock();
            let removed = registry.remove_owner(owner.id());
            if !removed.is_empty() {
                owner.unregister_source(self.inner.id);
            }
            removed
        };
        if !removed.is_empty() {
            trace!(signal = %self.inner.id, owner = %owner.id(), removed = removed.len(), "Disconnected");
        }
        removed.len()
    }

    /// Clear the registry, notifying every target
    pub fn disconnect_all(&self) -> usize {
        let (drained, notified) = {
            let _policy = self.inner.lock.enter();
            let mut registry = self.inner.registry.lock();
            let drained = mem::take(&mut registry.connections);
            let mut notified: Vec<OwnerId> = Vec::new();
            for conn in &drained {
                conn.expire();
                if notified.contains(&conn.owner()) {
                    continue;
                }
                notified.push(conn.owner());
                if let Some(owner) = conn.target() {
                    owner.unregister_source(self.inner.id);
                }
            }
            (drained, notified)
        };
        if !drained.is_empty() {
            debug!(
                signal = %self.inner.id,
                removed = drained.len(),
                owners = notified.len(),
                "Disconnected all slots"
            );
        }
        drained.len()
    }

    /// Deliver `args` to every live connection, then to every waiter
    pub fn emit(&self, args: A) {
        let snapshot = self.inner.snapshot();

        let mut delivered = 0;
        for conn in &snapshot {
            if conn.fire(args.clone()) {
                delivered += 1;
            }
        }
        let needs_prune = snapshot.iter().any(|conn| conn.is_expired());
        drop(snapshot);

        let waiters = self.inner.take_waiters();
        let mut resolved = 0;
        for waiter in waiters {
            if waiter.resolve(args.clone()) {
                resolved += 1;
            }
        }

        if needs_prune {
            self.inner.prune();
        }

        self.inner.stats.record_emit(delivered, resolved);
        trace!(signal = %self.inner.id, delivered, resolved, "Emitted");
    }

    /// Alias for [`Signal::emit`]
    #[inline]
    pub fn fire(&self, args: A) {
        self.emit(args)
    }

    /// Suspend until the next emission and resume with its payload
    ///
    /// Edge triggered: the awaiter is registered here, so emissions before
    /// this call are not observed. Use [`crate::Latch`] for the
    /// level-triggered variant.
    pub fn wait(&self) -> Awaiter<A> {
        Awaiter::register(&self.inner)
    }

    /// Live connections (fired one-shots awaiting prune are not counted)
    pub fn connection_count(&self) -> usize {
        self.inner
            .registry
            .lock()
            .connections
            .iter()
            .filter(|conn| !conn.is_expired())
            .count()
    }

    pub fn waiter_count(&self) -> usize {
        self.inner.registry.lock().waiters.len()
    }

    pub fn is_connected<T: HasSlots + ?Sized>(&self, target: &T) -> bool {
        let owner = target.slots().id();
        self.inner
            .registry
            .lock()
            .connections
            .iter()
            .any(|conn| conn.owner() == owner && !conn.is_expired())
    }

    pub fn stats(&self) -> SignalStats {
        let counters = self.inner.stats.snapshot();
        SignalStats {
            signal_id: self.inner.id,
            policy: self.policy(),
            connections: self.connection_count(),
            waiters: self.waiter_count(),
            total_emits: counters.total_emits,
            total_deliveries: counters.total_deliveries,
            total_waiters_resolved: counters.total_waiters_resolved,
            total_pruned: counters.total_pruned,
        }
    }
}

impl<A: Clone + Send + 'static> Default for Signal<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Clone + Send + 'static> Clone for Signal<A> {
    /// Copy construction: same targets, one new back-reference each
    fn clone(&self) -> Self {
        let copy = Signal::with_policy(self.policy());
        let source = self.inner.snapshot();

        let guard = copy.inner.lock.enter();
        let mut registry = copy.inner.registry.lock();
        for conn in source.iter().filter(|conn| !conn.is_expired()) {
            let Some(owner) = conn.target() else {
                continue;
            };
            if owner.register_source(copy.inner.id, copy.link()) {
                registry.connections.push(Arc::new(conn.duplicate()));
            }
        }
        debug!(
            from = %self.inner.id,
            to = %copy.inner.id,
            connections = registry.connections.len(),
            "Copied signal"
        );
        drop(registry);
        drop(guard);
        copy
    }
}

impl<A: Clone + Send + 'static> Drop for Signal<A> {
    /// Disconnect every slot and detach every waiter before teardown
    fn drop(&mut self) {
        self.disconnect_all();
        for waiter in self.inner.take_waiters() {
            waiter.detach();
        }
    }
}

impl<A: Clone + Send + 'static> fmt::Debug for Signal<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.inner.id)
            .field("policy", &self.policy())
            .field("connections", &self.connection_count())
            .field("waiters", &self.waiter_count())
            .finish()
    }
}
