//! RAII lease over an acquired resource.

use std::fmt;
use std::sync::Arc;

use crate::pool::Pool;

/// A borrowed resource that is released back to its pool on drop.
///
/// Obtained from [`Pool::lease`](crate::Pool::lease). Dereferences to the
/// resource. Use [`into_handle`](Lease::into_handle) to keep the handle and
/// take over the release yourself.
pub struct Lease<R: PartialEq> {
    pool: Pool<R>,
    handle: Option<Arc<R>>,
}

impl<R: PartialEq> Lease<R> {
    pub(crate) fn new(pool: Pool<R>, handle: Arc<R>) -> Self {
        Self {
            pool,
            handle: Some(handle),
        }
    }

    /// Take the resource handle out of the lease, skipping the automatic
    /// release. The caller is then responsible for calling
    /// [`Pool::release`](crate::Pool::release).
    #[must_use]
    pub fn into_handle(mut self) -> Arc<R> {
        self.handle.take().expect("lease already surrendered")
    }
}

impl<R: PartialEq> std::ops::Deref for Lease<R> {
    type Target = R;

    fn deref(&self) -> &R {
        self.handle.as_ref().expect("lease already surrendered")
    }
}

impl<R: PartialEq> Drop for Lease<R> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            // The handle came straight out of acquire, so the release can
            // only fail if the caller already released it by hand.
            let _ = self.pool.release(handle);
        }
    }
}

impl<R: PartialEq + fmt::Debug> fmt::Debug for Lease<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lease")
            .field("resource", &self.handle)
            .finish()
    }
}
