/*!
 * Waiter Slot
 * Shared resolution cell between a signal's waiter set and one awaiter
 */

use crate::core::id::WaiterId;
use parking_lot::Mutex;
use std::task::{Context, Poll, Waker};

struct WaiterState<A> {
    payload: Option<A>,
    waker: Option<Waker>,
    resolved: bool,
    detached: bool,
}

/// One registration in a signal's waiter set
///
/// Single writer (the emitting call) and single reader (the resumption it
/// triggers). Resolves at most once.
pub(crate) struct WaiterSlot<A> {
    id: WaiterId,
    state: Mutex<WaiterState<A>>,
}

impl<A> WaiterSlot<A> {
    pub fn new() -> Self {
        Self {
            id: WaiterId::next(),
            state: Mutex::new(WaiterState {
                payload: None,
                waker: None,
                resolved: false,
                detached: false,
            }),
        }
    }

    #[inline]
    pub fn id(&self) -> WaiterId {
        self.id
    }

    /// Store the payload and wake the suspended task
    ///
    /// The waker runs after the state lock is released because it re-polls
    /// the task, which reads this slot.
    pub fn resolve(&self, payload: A) -> bool {
        let waker = {
            let mut state = self.state.lock();
            if state.resolved || state.detached {
                return false;
            }
            state.resolved = true;
            state.payload = Some(payload);
            state.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
        true
    }

    /// The signal went away; this slot will never resolve
    pub fn detach(&self) {
        let waker = {
            let mut state = self.state.lock();
            state.detached = true;
            state.waker.take()
        };
        drop(waker);
    }

    pub fn is_resolved(&self) -> bool {
        self.state.lock().resolved
    }

    /// Take the payload, or remember the task's waker
    pub fn poll_payload(&self, cx: &mut Context<'_>) -> Poll<A> {
        let mut state = self.state.lock();
        if let Some(payload) = state.payload.take() {
            return Poll::Ready(payload);
        }
        if !state.resolved {
            match &state.waker {
                Some(waker) if waker.will_wake(cx.waker()) => {}
                _ => state.waker = Some(cx.waker().clone()),
            }
        }
        Poll::Pending
    }
}
