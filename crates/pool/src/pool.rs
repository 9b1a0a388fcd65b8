//! The pool engine: lifecycle gate, acquire/release paths, membership
//! mutation, and drain.
//!
//! All shared state lives in one [`Shared`] struct behind a single
//! `parking_lot::Mutex`: the ledger and the three waiter queues form one
//! exclusion domain, so every routing decision (hand a released resource to
//! a pending remove, to the eldest parked acquirer, or back to the
//! available set) is atomic.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, trace};

use crate::config::PoolConfig;
use crate::error::{Error, Result};
use crate::guard::Lease;
use crate::ledger::{Ledger, Status};
use crate::waiters::{AcquireQueue, DrainList, RemoveQueue};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

struct Shared<R: PartialEq> {
    ledger: Ledger<R>,
    acquirers: AcquireQueue<Grant<R>>,
    removers: RemoveQueue<R>,
    drainers: DrainList,
    total_acquisitions: u64,
    total_releases: u64,
    total_timeouts: u64,
}

impl<R: PartialEq> Shared<R> {
    fn new() -> Self {
        Self {
            ledger: Ledger::new(),
            acquirers: AcquireQueue::new(),
            removers: RemoveQueue::new(),
            drainers: DrainList::new(),
            total_acquisitions: 0,
            total_releases: 0,
            total_timeouts: 0,
        }
    }

    /// Wake every parked close caller once the last checkout is home.
    fn check_drain(&mut self) {
        if self.ledger.status == Status::Closed
            && !self.ledger.has_checked_out()
            && !self.drainers.is_empty()
        {
            debug!("pool drained; waking close waiters");
            self.drainers.complete_all();
        }
    }

    /// Move to `Closed` and refuse every parked acquirer. Broadcast, so no
    /// waiter is stranded.
    fn seal(&mut self) {
        if self.ledger.status != Status::Closed {
            self.ledger.status = Status::Closed;
            debug!(
                checked_out = self.ledger.checked_out_len(),
                "pool closed"
            );
        }
        self.acquirers.abort_all();
        self.check_drain();
    }
}

struct Inner<R: PartialEq> {
    shared: Mutex<Shared<R>>,
    config: PoolConfig,
}

/// Route a resource that just left the checked-out set, lock held.
///
/// Precedence: a parked `remove` targeting it wins; otherwise an open pool
/// hands it to the eldest parked acquirer or parks it as available; a
/// closed pool drops it from tracking instead. Completes drain waiters when
/// the last checkout comes home.
fn route_released<R: PartialEq>(inner: &Arc<Inner<R>>, shared: &mut Shared<R>, handle: Arc<R>) {
    if shared.removers.claim(&handle) {
        trace!("released resource claimed by pending remove");
        drop(handle);
    } else if shared.ledger.status == Status::Closed {
        // Releasing into a closed pool is legal; the resource simply
        // leaves the ledger and can never be acquired again.
        drop(handle);
    } else {
        offer_or_park(inner, shared, handle);
    }
    shared.check_drain();
}

/// Hand a resource to the eldest live parked acquirer, or park it as
/// available when nobody is waiting. Lock held.
fn offer_or_park<R: PartialEq>(inner: &Arc<Inner<R>>, shared: &mut Shared<R>, handle: Arc<R>) {
    // The checked-out entry is recorded before the grant is offered so the
    // woken acquirer observes a consistent ledger.
    shared.ledger.note_checked_out(Arc::clone(&handle));
    let grant = Grant::new(handle, Arc::clone(inner));
    if let Some(unsent) = shared.acquirers.offer(grant) {
        let handle = unsent.defuse();
        shared.ledger.uncheck(&handle);
        shared.ledger.park(handle);
    }
}

// ---------------------------------------------------------------------------
// Grant
// ---------------------------------------------------------------------------

/// A resource in flight from the ledger to one parked acquirer.
///
/// The resource is already recorded as checked out when the grant is sent.
/// If the acquirer has gone away by the time the grant lands (its deadline
/// elapsed or its future was dropped), the grant's drop hook reroutes the
/// resource through the normal release path instead of leaking it.
pub(crate) struct Grant<R: PartialEq> {
    resource: Option<Arc<R>>,
    inner: Arc<Inner<R>>,
}

impl<R: PartialEq> Grant<R> {
    fn new(resource: Arc<R>, inner: Arc<Inner<R>>) -> Self {
        Self {
            resource: Some(resource),
            inner,
        }
    }

    /// Take the resource without counting an acquisition (the grant is
    /// being unwound, not served).
    fn defuse(mut self) -> Arc<R> {
        self.resource.take().expect("grant resource already taken")
    }

    /// Take the resource as a served acquisition.
    fn claim(mut self) -> Arc<R> {
        let handle = self.resource.take().expect("grant resource already taken");
        self.inner.shared.lock().total_acquisitions += 1;
        handle
    }
}

impl<R: PartialEq> Drop for Grant<R> {
    fn drop(&mut self) {
        if let Some(handle) = self.resource.take() {
            let inner = Arc::clone(&self.inner);
            let mut shared = inner.shared.lock();
            shared.ledger.uncheck(&handle);
            route_released(&inner, &mut shared, handle);
        }
    }
}

// ---------------------------------------------------------------------------
// Pool
// ---------------------------------------------------------------------------

/// Snapshot of pool counters.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Resources currently eligible for acquisition.
    pub available: usize,
    /// Resources currently held by callers.
    pub checked_out: usize,
    /// Acquirers currently parked.
    pub waiting: usize,
    /// Total successful acquisitions.
    pub total_acquisitions: u64,
    /// Total releases back into the pool.
    pub total_releases: u64,
    /// Total acquire deadlines that elapsed unserved.
    pub total_timeouts: u64,
}

/// Outcome of admission: served on the spot, or parked in the FIFO queue.
enum Admission<R: PartialEq> {
    Granted(Arc<R>),
    Parked(oneshot::Receiver<Grant<R>>),
}

/// A generic, thread-safe resource pool with explicit membership.
///
/// Cloning is cheap and every clone operates on the same pool. See the
/// crate docs for the lifecycle and borrowing contract.
pub struct Pool<R: PartialEq> {
    inner: Arc<Inner<R>>,
}

impl<R: PartialEq> Clone for Pool<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: PartialEq> Default for Pool<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: PartialEq> fmt::Debug for Pool<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool").field("stats", &self.stats()).finish()
    }
}

impl<R: PartialEq> Pool<R> {
    /// Create an empty pool in the unopened state.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    /// Create an empty pool with the given configuration.
    #[must_use]
    pub fn with_config(config: PoolConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                shared: Mutex::new(Shared::new()),
                config,
            }),
        }
    }

    // -- lifecycle ----------------------------------------------------------

    /// Open the pool for acquisition. Non-blocking and idempotent.
    ///
    /// Acquirers that parked before the pool was opened are served from the
    /// available set, eldest first. Opening a closed pool is a no-op: the
    /// lifecycle is `unopened -> open -> closed` with no way back.
    pub fn open(&self) {
        let mut shared = self.inner.shared.lock();
        match shared.ledger.status {
            Status::Unopened => {
                shared.ledger.status = Status::Open;
                debug!(available = shared.ledger.available_len(), "pool opened");
                while shared.acquirers.has_live_waiter() {
                    match shared.ledger.take_available() {
                        Some(handle) => offer_or_park(&self.inner, &mut shared, handle),
                        None => break,
                    }
                }
            }
            Status::Open => {}
            Status::Closed => {
                debug!("open ignored: pool already closed");
            }
        }
    }

    /// Check whether the pool is open. Non-blocking, advisory: the answer
    /// may be stale by the time the caller acts on it.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.inner.shared.lock().ledger.status == Status::Open
    }

    /// Close the pool immediately. Non-blocking.
    ///
    /// New acquires fail fast from this instant and every parked acquirer
    /// is woken with [`Error::Closed`]. Checked-out resources are not
    /// waited for; their holders may still [`release`](Self::release) them.
    pub fn close_now(&self) {
        self.inner.shared.lock().seal();
    }

    /// Close the pool and wait for every checked-out resource to come home.
    ///
    /// Acquisition is refused from the instant this is called; the call
    /// then parks until the checked-out set is empty. Concurrent `close`
    /// callers are all woken when the drain completes.
    pub async fn close(&self) {
        let rx = {
            let mut shared = self.inner.shared.lock();
            shared.seal();
            if !shared.ledger.has_checked_out() {
                return;
            }
            shared.drainers.enqueue()
        };
        let _ = rx.await;
    }

    // -- acquire / release --------------------------------------------------

    /// Borrow a resource, parking until one is available.
    ///
    /// Parks while the pool is unopened; fails fast with [`Error::Closed`]
    /// once the pool is closed, including when the close happens mid-wait.
    /// If the pool was configured with a default acquire deadline, it
    /// applies here.
    pub async fn acquire(&self) -> Result<Arc<R>> {
        if let Some(limit) = self.inner.config.acquire_timeout {
            return self.acquire_timeout(limit).await;
        }
        match self.admit()? {
            Admission::Granted(handle) => Ok(handle),
            Admission::Parked(rx) => match rx.await {
                Ok(grant) => Ok(grant.claim()),
                Err(_) => Err(Error::Closed),
            },
        }
    }

    /// Borrow a resource, parking at most `limit`.
    ///
    /// The deadline spans the whole wait, including the unopened state.
    /// Expiry fails with [`Error::Timeout`], distinct from
    /// [`Error::Closed`].
    pub async fn acquire_timeout(&self, limit: Duration) -> Result<Arc<R>> {
        let mut rx = match self.admit()? {
            Admission::Granted(handle) => return Ok(handle),
            Admission::Parked(rx) => rx,
        };
        match tokio::time::timeout(limit, &mut rx).await {
            Ok(Ok(grant)) => Ok(grant.claim()),
            Ok(Err(_)) => Err(Error::Closed),
            Err(_) => {
                // Deadline elapsed. Close the channel first: a grant racing
                // the deadline either landed already (drained below and
                // returned as a success) or is refused and rerouted by the
                // sender.
                rx.close();
                match rx.try_recv() {
                    Ok(grant) => Ok(grant.claim()),
                    Err(_) => {
                        let mut shared = self.inner.shared.lock();
                        shared.total_timeouts += 1;
                        shared.acquirers.reap();
                        Err(Error::Timeout { waited: limit })
                    }
                }
            }
        }
    }

    /// Take an available resource on the spot, or park FIFO.
    fn admit(&self) -> Result<Admission<R>> {
        let mut shared = self.inner.shared.lock();
        match shared.ledger.status {
            Status::Closed => Err(Error::Closed),
            Status::Unopened => Ok(Admission::Parked(shared.acquirers.enqueue())),
            Status::Open => {
                // A newcomer must not overtake a live parked waiter.
                if !shared.acquirers.has_live_waiter() {
                    if let Some(handle) = shared.ledger.check_out_front() {
                        shared.total_acquisitions += 1;
                        trace!("resource checked out");
                        return Ok(Admission::Granted(handle));
                    }
                }
                Ok(Admission::Parked(shared.acquirers.enqueue()))
            }
        }
    }

    /// Return a checked-out resource to the pool. Non-blocking.
    ///
    /// The resource is matched by the caller type's equality. Releasing a
    /// resource that is not checked out (never added, still available, or
    /// already released) is a precondition violation reported as
    /// [`Error::NotCheckedOut`]; the ledger is left untouched.
    ///
    /// Releasing into a closed pool succeeds: the resource leaves the
    /// checked-out set (satisfying a parked [`remove`](Self::remove) or the
    /// drain) but is not made acquirable again.
    pub fn release(&self, resource: Arc<R>) -> Result<()> {
        let mut shared = self.inner.shared.lock();
        let Some(handle) = shared.ledger.release_checked_out(&resource) else {
            return Err(Error::NotCheckedOut);
        };
        shared.total_releases += 1;
        trace!("resource released");
        route_released(&self.inner, &mut shared, handle);
        Ok(())
    }

    /// Borrow a resource wrapped in an RAII [`Lease`] that releases it on
    /// drop.
    pub async fn lease(&self) -> Result<Lease<R>> {
        let handle = self.acquire().await?;
        Ok(Lease::new(self.clone(), handle))
    }

    /// Timeout-bounded variant of [`lease`](Self::lease).
    pub async fn lease_timeout(&self, limit: Duration) -> Result<Lease<R>> {
        let handle = self.acquire_timeout(limit).await?;
        Ok(Lease::new(self.clone(), handle))
    }

    // -- membership ---------------------------------------------------------

    /// Add a resource to the pool. Non-blocking.
    ///
    /// Returns false if an equal resource is already tracked (available or
    /// checked out); duplicates are refused rather than double-entered.
    /// Legal in every lifecycle state: resources added before `open` become
    /// acquirable when the pool opens; resources added after close are
    /// tracked but can never be acquired.
    pub fn add(&self, resource: R) -> bool {
        let mut shared = self.inner.shared.lock();
        if shared.ledger.is_tracked(&resource) {
            return false;
        }
        let handle = Arc::new(resource);
        match shared.ledger.status {
            Status::Open => offer_or_park(&self.inner, &mut shared, handle),
            Status::Unopened | Status::Closed => shared.ledger.park(handle),
        }
        trace!(available = shared.ledger.available_len(), "resource added");
        true
    }

    /// Remove a resource, parking until it is not checked out.
    ///
    /// Returns false immediately if the resource is untracked. If it is
    /// available it is removed on the spot; if it is checked out the call
    /// parks until that specific resource is released, then removes it.
    /// When several `remove` calls target the same resource, exactly one
    /// wins; the rest return false.
    pub async fn remove(&self, resource: &R) -> bool {
        let rx = {
            let mut shared = self.inner.shared.lock();
            if shared.ledger.remove_available(resource) {
                trace!("resource removed");
                return true;
            }
            let Some(target) = shared.ledger.checked_out_handle(resource) else {
                return false;
            };
            shared.removers.enqueue(target)
        };
        rx.await.unwrap_or(false)
    }

    /// Remove a resource only if it is currently available. Non-blocking.
    ///
    /// Returns false if the resource is checked out or untracked; an
    /// in-use resource is never evicted.
    pub fn remove_now(&self, resource: &R) -> bool {
        let mut shared = self.inner.shared.lock();
        let removed = shared.ledger.remove_available(resource);
        if removed {
            trace!("resource removed");
        }
        removed
    }

    // -- introspection ------------------------------------------------------

    /// Snapshot of the pool counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        let mut shared = self.inner.shared.lock();
        shared.acquirers.reap();
        PoolStats {
            available: shared.ledger.available_len(),
            checked_out: shared.ledger.checked_out_len(),
            waiting: shared.acquirers.len(),
            total_acquisitions: shared.total_acquisitions,
            total_releases: shared.total_releases,
            total_timeouts: shared.total_timeouts,
        }
    }

    /// Number of resources currently eligible for acquisition. Advisory.
    #[must_use]
    pub fn available(&self) -> usize {
        self.inner.shared.lock().ledger.available_len()
    }

    /// Number of resources currently held by callers. Advisory.
    #[must_use]
    pub fn checked_out(&self) -> usize {
        self.inner.shared.lock().ledger.checked_out_len()
    }
}
