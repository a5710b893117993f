/*!
 * Signal Awaiter
 * Future resolving with the payload of a signal's next emission
 */

use super::waiter::WaiterSlot;
use crate::signals::SignalInner;
use futures::future::FusedFuture;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

/// Await-expression over a signal
///
/// Registered with the signal when created, so only emissions after
/// `signal.wait()` are observed. Dropping an unresolved awaiter
/// deregisters it. If the signal is dropped first, the awaiter stays
/// pending forever, like a signal that never fires again.
#[must_use = "an awaiter does nothing unless awaited"]
pub struct Awaiter<A: Clone + Send + 'static> {
    signal: Weak<SignalInner<A>>,
    slot: Option<Arc<WaiterSlot<A>>>,
}

impl<A: Clone + Send + 'static> Awaiter<A> {
    pub(crate) fn register(signal: &Arc<SignalInner<A>>) -> Self {
        let slot = Arc::new(WaiterSlot::new());
        signal.add_waiter(Arc::clone(&slot));
        Self {
            signal: Arc::downgrade(signal),
            slot: Some(slot),
        }
    }

    /// Register on a signal that may already be gone
    pub(crate) fn register_weak(signal: &Weak<SignalInner<A>>) -> Self {
        match signal.upgrade() {
            Some(signal) => Self::register(&signal),
            None => {
                let slot = Arc::new(WaiterSlot::new());
                slot.detach();
                Self {
                    signal: Weak::clone(signal),
                    slot: Some(slot),
                }
            }
        }
    }

    /// True once an emission delivered a payload to this awaiter
    pub fn is_resolved(&self) -> bool {
        self.slot.as_ref().map_or(true, |slot| slot.is_resolved())
    }
}

impl<A: Clone + Send + 'static> Future for Awaiter<A> {
    type Output = A;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<A> {
        let this = self.get_mut();
        let slot = this
            .slot
            .as_ref()
            .expect("Awaiter polled after completion");
        match slot.poll_payload(cx) {
            Poll::Ready(payload) => {
                // Already detached from the signal by the emit batch
                this.slot = None;
                Poll::Ready(payload)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<A: Clone + Send + 'static> FusedFuture for Awaiter<A> {
    fn is_terminated(&self) -> bool {
        self.slot.is_none()
    }
}

impl<A: Clone + Send + 'static> Drop for Awaiter<A> {
    fn drop(&mut self) {
        let Some(slot) = self.slot.take() else {
            return;
        };
        if slot.is_resolved() {
            return;
        }
        // A concurrent emit may have detached the batch already; then this is a no-op
        if let Some(signal) = self.signal.upgrade() {
            signal.remove_waiter(slot.id());
        }
    }
}

impl<A: Clone + Send + 'static> fmt::Debug for Awaiter<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Awaiter")
            .field("waiter", &self.slot.as_ref().map(|slot| slot.id()))
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::signals::Signal;
    use futures::task::noop_waker;
    use std::future::Future;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    #[test]
    fn test_wait_registers_immediately() {
        let signal: Signal<u32> = Signal::new();
        let awaiter = signal.wait();
        assert_eq!(signal.waiter_count(), 1);
        drop(awaiter);
        assert_eq!(signal.waiter_count(), 0);
    }

    #[test]
    fn test_poll_after_emit_yields_payload() {
        let signal: Signal<(u8, &'static str)> = Signal::new();
        let mut awaiter = signal.wait();
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);

        assert_eq!(Pin::new(&mut awaiter).poll(&mut cx), Poll::Pending);
        signal.emit((3, "three"));
        assert!(awaiter.is_resolved());
        assert_eq!(signal.waiter_count(), 0);
        assert_eq!(Pin::new(&mut awaiter).poll(&mut cx), Poll::Ready((3, "three")));
    }

    #[test]
    fn test_emit_before_wait_is_lost() {
        let signal: Signal<()> = Signal::new();
        signal.emit(());
        let mut awaiter = signal.wait();
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);
        assert_eq!(Pin::new(&mut awaiter).poll(&mut cx), Poll::Pending);
    }

    #[test]
    fn test_signal_drop_leaves_awaiter_pending() {
        let signal: Signal<i64> = Signal::new();
        let mut awaiter = signal.wait();
        drop(signal);

        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);
        assert_eq!(Pin::new(&mut awaiter).poll(&mut cx), Poll::Pending);
    }
}
