//! # corral-pool
//!
//! A generic, thread-safe resource pool with explicit membership.
//!
//! [`Pool<R>`] tracks a set of interchangeable resources (connections,
//! buffers, workers) that callers borrow with [`Pool::acquire`] and hand
//! back with [`Pool::release`]. The pool never constructs, destroys,
//! inspects or mutates a resource; callers grow and shrink membership
//! explicitly with [`Pool::add`], [`Pool::remove`] and [`Pool::remove_now`].
//!
//! A freshly constructed pool is not open: acquirers park until [`Pool::open`]
//! is called. Shutdown is either graceful ([`Pool::close`], which refuses new
//! acquires immediately but waits for every outstanding resource to come
//! home) or immediate ([`Pool::close_now`]). A closed pool is closed for
//! good.
//!
//! Resources are tracked as [`std::sync::Arc`] handles, so the only bound on
//! `R` is equality comparison: membership tests use the caller type's
//! `PartialEq`.
//!
//! # Example
//!
//! ```
//! use corral_pool::Pool;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let pool: Pool<String> = Pool::new();
//! pool.add("conn-1".to_string());
//! pool.open();
//!
//! let conn = pool.acquire().await.unwrap();
//! assert_eq!(*conn, "conn-1");
//! pool.release(conn).unwrap();
//!
//! pool.close().await;
//! # }
//! ```

pub mod config;
pub mod error;

mod guard;
mod ledger;
mod pool;
mod waiters;

pub use config::PoolConfig;
pub use error::{Error, Result};
pub use guard::Lease;
pub use pool::{Pool, PoolStats};
