//! Membership ledger: which resources are available, which are checked
//! out, and the pool lifecycle status.
//!
//! Pure bookkeeping; all synchronization lives with the mutex that owns
//! the ledger. A tracked resource is in exactly one of `available` or
//! `checked_out`; the pool-side handle is an `Arc` so a checked-out
//! resource stays addressable for membership tests while the caller holds
//! its own handle.

use std::collections::VecDeque;
use std::sync::Arc;

/// Pool lifecycle status.
///
/// `Unopened` is the construction state: acquirers park until the pool is
/// opened. `Closed` is terminal: acquirers fail fast and the pool never
/// reopens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Status {
    Unopened,
    Open,
    Closed,
}

/// Membership ledger for one pool.
pub(crate) struct Ledger<R> {
    pub(crate) status: Status,
    available: VecDeque<Arc<R>>,
    checked_out: Vec<Arc<R>>,
}

impl<R: PartialEq> Ledger<R> {
    pub(crate) fn new() -> Self {
        Self {
            status: Status::Unopened,
            available: VecDeque::new(),
            checked_out: Vec::new(),
        }
    }

    /// True if the resource is tracked, in either set.
    pub(crate) fn is_tracked(&self, resource: &R) -> bool {
        self.available.iter().any(|r| **r == *resource)
            || self.checked_out.iter().any(|r| **r == *resource)
    }

    /// Park a resource in the available set.
    pub(crate) fn park(&mut self, handle: Arc<R>) {
        debug_assert!(!self.available.iter().any(|r| Arc::ptr_eq(r, &handle)));
        self.available.push_back(handle);
    }

    /// Take the oldest available resource without marking it checked out.
    pub(crate) fn take_available(&mut self) -> Option<Arc<R>> {
        self.available.pop_front()
    }

    /// Record a resource as checked out.
    pub(crate) fn note_checked_out(&mut self, handle: Arc<R>) {
        self.checked_out.push(handle);
    }

    /// Move the oldest available resource to checked-out, returning the
    /// caller-side handle.
    pub(crate) fn check_out_front(&mut self) -> Option<Arc<R>> {
        let handle = self.available.pop_front()?;
        self.checked_out.push(Arc::clone(&handle));
        Some(handle)
    }

    /// Take a checked-out entry back out of the set by value equality,
    /// returning the pool-side handle.
    pub(crate) fn release_checked_out(&mut self, resource: &R) -> Option<Arc<R>> {
        let i = self.checked_out.iter().position(|r| **r == *resource)?;
        Some(self.checked_out.swap_remove(i))
    }

    /// Forget a checked-out entry by handle identity (used when a grant
    /// comes back unclaimed).
    pub(crate) fn uncheck(&mut self, handle: &Arc<R>) {
        if let Some(i) = self.checked_out.iter().position(|r| Arc::ptr_eq(r, handle)) {
            self.checked_out.swap_remove(i);
        }
    }

    /// Clone the pool-side handle of a checked-out resource.
    pub(crate) fn checked_out_handle(&self, resource: &R) -> Option<Arc<R>> {
        self.checked_out
            .iter()
            .find(|r| ***r == *resource)
            .map(Arc::clone)
    }

    /// Drop a resource from the available set. False if it is checked out
    /// or untracked.
    pub(crate) fn remove_available(&mut self, resource: &R) -> bool {
        match self.available.iter().position(|r| **r == *resource) {
            Some(i) => self.available.remove(i).is_some(),
            None => false,
        }
    }

    pub(crate) fn available_len(&self) -> usize {
        self.available.len()
    }

    pub(crate) fn checked_out_len(&self) -> usize {
        self.checked_out.len()
    }

    pub(crate) fn has_checked_out(&self) -> bool {
        !self.checked_out.is_empty()
    }
}
