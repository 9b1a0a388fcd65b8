//! Waiter bookkeeping for the three wait predicates: any-resource
//! (acquire), specific-resource (remove), and drain-complete (close).
//!
//! Every waiter is a `oneshot` sender registered under the pool lock; the
//! parked task holds the receiver. A waiter whose receiver has gone away
//! (timeout or cancellation) is detected with `Sender::is_closed` and
//! skipped, so an abandoned wait never strands a resource or a wakeup.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::oneshot;

// ---------------------------------------------------------------------------
// AcquireQueue
// ---------------------------------------------------------------------------

/// FIFO queue of parked acquirers.
pub(crate) struct AcquireQueue<T> {
    waiters: VecDeque<oneshot::Sender<T>>,
}

impl<T> AcquireQueue<T> {
    pub(crate) fn new() -> Self {
        Self {
            waiters: VecDeque::new(),
        }
    }

    /// Register a waiter at the back of the queue.
    pub(crate) fn enqueue(&mut self) -> oneshot::Receiver<T> {
        let (tx, rx) = oneshot::channel();
        self.waiters.push_back(tx);
        rx
    }

    /// Offer `value` to the eldest live waiter, consuming abandoned waiters
    /// along the way. Returns the value back if no live waiter accepted it.
    pub(crate) fn offer(&mut self, mut value: T) -> Option<T> {
        while let Some(tx) = self.waiters.pop_front() {
            match tx.send(value) {
                Ok(()) => return None,
                Err(v) => value = v,
            }
        }
        Some(value)
    }

    /// True if any registered waiter is still parked.
    pub(crate) fn has_live_waiter(&self) -> bool {
        self.waiters.iter().any(|w| !w.is_closed())
    }

    /// Drop every registered waiter; their receivers resolve with an error.
    pub(crate) fn abort_all(&mut self) {
        self.waiters.clear();
    }

    /// Drop waiters whose receiver has gone away.
    pub(crate) fn reap(&mut self) {
        self.waiters.retain(|w| !w.is_closed());
    }

    /// Number of registered waiters, live or abandoned.
    pub(crate) fn len(&self) -> usize {
        self.waiters.len()
    }
}

// ---------------------------------------------------------------------------
// RemoveQueue
// ---------------------------------------------------------------------------

struct RemoveWaiter<R> {
    target: Arc<R>,
    tx: oneshot::Sender<bool>,
}

/// Parked targeted removals, each waiting for one specific checked-out
/// resource to come home.
pub(crate) struct RemoveQueue<R> {
    waiters: Vec<RemoveWaiter<R>>,
}

impl<R: PartialEq> RemoveQueue<R> {
    pub(crate) fn new() -> Self {
        Self {
            waiters: Vec::new(),
        }
    }

    /// Register a waiter for `target`.
    pub(crate) fn enqueue(&mut self, target: Arc<R>) -> oneshot::Receiver<bool> {
        let (tx, rx) = oneshot::channel();
        self.waiters.push(RemoveWaiter { target, tx });
        rx
    }

    /// A release of `resource` is in flight. The first live waiter
    /// targeting it claims the removal and is woken with `true`; once
    /// claimed, every other waiter on the same target is woken with `false`
    /// (the resource is no longer tracked). Returns whether the resource
    /// was claimed for removal.
    pub(crate) fn claim(&mut self, resource: &R) -> bool {
        if !self.waiters.iter().any(|w| *w.target == *resource) {
            return false;
        }

        let mut rest = Vec::with_capacity(self.waiters.len());
        let mut matching = Vec::new();
        for waiter in self.waiters.drain(..) {
            if *waiter.target == *resource {
                matching.push(waiter);
            } else {
                rest.push(waiter);
            }
        }
        self.waiters = rest;

        let mut claimed = false;
        for waiter in matching {
            if claimed {
                let _ = waiter.tx.send(false);
            } else if waiter.tx.send(true).is_ok() {
                claimed = true;
            }
        }
        claimed
    }
}

// ---------------------------------------------------------------------------
// DrainList
// ---------------------------------------------------------------------------

/// Close callers parked until the checked-out set empties.
pub(crate) struct DrainList {
    waiters: Vec<oneshot::Sender<()>>,
}

impl DrainList {
    pub(crate) fn new() -> Self {
        Self {
            waiters: Vec::new(),
        }
    }

    pub(crate) fn enqueue(&mut self) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        self.waiters.push(tx);
        rx
    }

    /// Wake every drain waiter. Broadcast, never a single wakeup.
    pub(crate) fn complete_all(&mut self) {
        for tx in self.waiters.drain(..) {
            let _ = tx.send(());
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offer_serves_waiters_in_fifo_order() {
        let mut queue: AcquireQueue<u32> = AcquireQueue::new();
        let mut rx1 = queue.enqueue();
        let mut rx2 = queue.enqueue();

        assert!(queue.offer(10).is_none());
        assert!(queue.offer(20).is_none());
        assert_eq!(rx1.try_recv().unwrap(), 10);
        assert_eq!(rx2.try_recv().unwrap(), 20);
    }

    #[test]
    fn offer_skips_abandoned_waiters() {
        let mut queue: AcquireQueue<u32> = AcquireQueue::new();
        let rx1 = queue.enqueue();
        let mut rx2 = queue.enqueue();
        drop(rx1);

        assert!(queue.offer(7).is_none());
        assert_eq!(rx2.try_recv().unwrap(), 7);
    }

    #[test]
    fn offer_returns_value_when_no_live_waiter() {
        let mut queue: AcquireQueue<u32> = AcquireQueue::new();
        assert_eq!(queue.offer(1), Some(1));

        let rx = queue.enqueue();
        drop(rx);
        assert_eq!(queue.offer(2), Some(2));
        assert_eq!(queue.len(), 0, "abandoned waiter consumed by offer");
    }

    #[test]
    fn reap_drops_only_abandoned_waiters() {
        let mut queue: AcquireQueue<u32> = AcquireQueue::new();
        let rx1 = queue.enqueue();
        let _rx2 = queue.enqueue();
        drop(rx1);

        queue.reap();
        assert_eq!(queue.len(), 1);
        assert!(queue.has_live_waiter());
    }

    #[test]
    fn claim_wakes_first_live_waiter_with_true_and_rest_with_false() {
        let mut queue: RemoveQueue<u32> = RemoveQueue::new();
        let target = Arc::new(4);
        let mut rx1 = queue.enqueue(Arc::clone(&target));
        let mut rx2 = queue.enqueue(Arc::clone(&target));
        let mut other = queue.enqueue(Arc::new(9));

        assert!(queue.claim(&4));
        assert!(rx1.try_recv().unwrap());
        assert!(!rx2.try_recv().unwrap());
        assert!(other.try_recv().is_err(), "unrelated target left parked");
    }

    #[test]
    fn claim_without_matching_waiter_is_false() {
        let mut queue: RemoveQueue<u32> = RemoveQueue::new();
        let _rx = queue.enqueue(Arc::new(1));
        assert!(!queue.claim(&2));
    }

    #[test]
    fn claim_with_only_abandoned_waiters_is_false() {
        let mut queue: RemoveQueue<u32> = RemoveQueue::new();
        let rx = queue.enqueue(Arc::new(3));
        drop(rx);
        assert!(!queue.claim(&3), "abandoned remove must not eat the release");
    }

    #[test]
    fn drain_completion_is_broadcast() {
        let mut drainers = DrainList::new();
        let mut rx1 = drainers.enqueue();
        let mut rx2 = drainers.enqueue();

        drainers.complete_all();
        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
        assert!(drainers.is_empty());
    }
}
