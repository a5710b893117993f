/*!
 * Latch
 * Level-triggered awaiting: an emission before the wait is not lost
 */

use super::wait::Awaiter;
use crate::signals::{HasSlots, Signal, SignalInner, Slots};
use futures::future::FusedFuture;
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};
use tracing::trace;

/// Buffers the latest payload of a signal
///
/// Unlike [`Signal::wait`], [`Latch::wait`] resolves immediately once the
/// signal has fired, and keeps doing so until [`Latch::reset`].
///
/// ```
/// use sigslot::{Latch, Signal};
///
/// let ready: Signal<u32> = Signal::new();
/// let latch = Latch::new(&ready);
/// ready.emit(5);
/// assert_eq!(latch.value(), Some(5));
/// ```
pub struct Latch<A: Clone + Send + 'static> {
    signal: Weak<SignalInner<A>>,
    buffer: Arc<Mutex<Option<A>>>,
    slots: Slots,
}

impl<A: Clone + Send + 'static> Latch<A> {
    pub fn new(signal: &Signal<A>) -> Self {
        let slots = Slots::with_policy(signal.policy());
        let buffer = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&buffer);
        signal.connect(&slots, move |payload| {
            *sink.lock() = Some(payload);
        });
        Self {
            signal: signal.downgrade(),
            buffer,
            slots,
        }
    }

    /// Whether the signal has fired since creation or the last reset
    pub fn is_set(&self) -> bool {
        self.buffer.lock().is_some()
    }

    /// Latest buffered payload
    pub fn value(&self) -> Option<A> {
        self.buffer.lock().clone()
    }

    /// Clear the buffer so the next wait suspends again
    pub fn reset(&self) -> Option<A> {
        self.buffer.lock().take()
    }

    /// Resolve now if the signal already fired, otherwise at its next emission
    pub fn wait(&self) -> LatchWait<A> {
        // Register before checking, so an emit between the two is not lost
        let awaiter = Awaiter::register_weak(&self.signal);
        match self.value() {
            Some(payload) => {
                trace!(owner = %self.slots.id(), "Latch already set");
                LatchWait {
                    state: LatchState::Ready(Some(payload)),
                }
            }
            None => LatchWait {
                state: LatchState::Waiting(awaiter),
            },
        }
    }
}

impl<A: Clone + Send + 'static> HasSlots for Latch<A> {
    fn slots(&self) -> &Slots {
        &self.slots
    }
}

impl<A: Clone + Send + 'static> fmt::Debug for Latch<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Latch")
            .field("owner", &self.slots.id())
            .field("set", &self.is_set())
            .finish()
    }
}

enum LatchState<A: Clone + Send + 'static> {
    Ready(Option<A>),
    Waiting(Awaiter<A>),
}

/// Future returned by [`Latch::wait`]
#[must_use = "a latch wait does nothing unless awaited"]
pub struct LatchWait<A: Clone + Send + 'static> {
    state: LatchState<A>,
}

// The buffered payload is never pinned
impl<A: Clone + Send + 'static> Unpin for LatchWait<A> {}

impl<A: Clone + Send + 'static> LatchWait<A> {
    /// True when no suspension will happen
    pub fn is_immediate(&self) -> bool {
        matches!(self.state, LatchState::Ready(Some(_)))
    }
}

impl<A: Clone + Send + 'static> Future for LatchWait<A> {
    type Output = A;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<A> {
        match &mut self.get_mut().state {
            LatchState::Ready(payload) => match payload.take() {
                Some(payload) => Poll::Ready(payload),
                None => panic!("LatchWait polled after completion"),
            },
            LatchState::Waiting(awaiter) => Pin::new(awaiter).poll(cx),
        }
    }
}

impl<A: Clone + Send + 'static> FusedFuture for LatchWait<A> {
    fn is_terminated(&self) -> bool {
        match &self.state {
            LatchState::Ready(payload) => payload.is_none(),
            LatchState::Waiting(awaiter) => awaiter.is_terminated(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::task::noop_waker;

    #[test]
    fn test_wait_after_fire_is_immediate() {
        let signal: Signal<&'static str> = Signal::new();
        let latch = Latch::new(&signal);
        signal.emit("fired");

        let mut wait = latch.wait();
        assert!(wait.is_immediate());
        assert_eq!(signal.waiter_count(), 0);

        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);
        assert_eq!(Pin::new(&mut wait).poll(&mut cx), Poll::Ready("fired"));
        assert!(latch.is_set());
    }

    #[test]
    fn test_reset_makes_wait_suspend() {
        let signal: Signal<u8> = Signal::new();
        let latch = Latch::new(&signal);
        signal.emit(1);
        assert_eq!(latch.reset(), Some(1));

        let mut wait = latch.wait();
        assert!(!wait.is_immediate());
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);
        assert_eq!(Pin::new(&mut wait).poll(&mut cx), Poll::Pending);

        signal.emit(2);
        assert_eq!(Pin::new(&mut wait).poll(&mut cx), Poll::Ready(2));
    }

    #[test]
    fn test_latch_disconnects_on_drop() {
        let signal: Signal<u8> = Signal::new();
        let latch = Latch::new(&signal);
        assert_eq!(signal.connection_count(), 1);
        drop(latch);
        assert_eq!(signal.connection_count(), 0);
    }
}
