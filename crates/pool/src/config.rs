//! Pool configuration types

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for a [`Pool`](crate::Pool).
///
/// The pool has no sizing or eviction policy of its own (membership is
/// entirely caller-driven), so configuration is limited to wait behavior.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PoolConfig {
    /// Default deadline applied by [`acquire`](crate::Pool::acquire).
    ///
    /// `None` (the default) means acquirers park indefinitely. An explicit
    /// [`acquire_timeout`](crate::Pool::acquire_timeout) call always takes
    /// its own deadline instead.
    pub acquire_timeout: Option<Duration>,
}

impl PoolConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default acquire deadline.
    #[must_use]
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = Some(timeout);
        self
    }
}
