//! Lifecycle gate tests: the unopened -> open -> closed state machine and
//! the acquire semantics in each state.

use std::time::Duration;

use corral_pool::{Error, Pool};

#[tokio::test]
async fn fresh_pool_is_not_open() {
    let pool: Pool<u32> = Pool::new();
    assert!(!pool.is_open());
}

#[tokio::test]
async fn open_is_visible_and_idempotent() {
    let pool: Pool<u32> = Pool::new();
    pool.open();
    assert!(pool.is_open());
    pool.open();
    assert!(pool.is_open(), "double open is a no-op");
}

#[tokio::test]
async fn close_now_is_visible() {
    let pool: Pool<u32> = Pool::new();
    pool.open();
    pool.close_now();
    assert!(!pool.is_open());
}

#[tokio::test]
async fn acquire_parks_on_unopened_pool_until_open() {
    let pool: Pool<u32> = Pool::new();
    pool.add(7);

    let waiter = {
        let pool = pool.clone();
        tokio::spawn(async move { pool.acquire().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(
        !waiter.is_finished(),
        "acquire must park while the pool is unopened"
    );

    pool.open();
    let handle = tokio::time::timeout(Duration::from_secs(1), waiter)
        .await
        .expect("open must wake the parked acquirer")
        .expect("acquirer task must not panic")
        .expect("acquire must succeed once the pool opens");
    assert_eq!(*handle, 7);
}

#[tokio::test]
async fn acquire_fails_fast_after_close_now() {
    let pool: Pool<u32> = Pool::new();
    pool.add(1);
    pool.open();
    pool.close_now();

    let result = tokio::time::timeout(Duration::from_millis(100), pool.acquire())
        .await
        .expect("acquire on a closed pool must not park");
    assert_eq!(result.unwrap_err(), Error::Closed);
}

#[tokio::test]
async fn close_on_unopened_pool_returns_immediately() {
    let pool: Pool<u32> = Pool::new();
    pool.add(1);

    tokio::time::timeout(Duration::from_millis(100), pool.close())
        .await
        .expect("nothing is checked out, close must not park");
    assert!(!pool.is_open());
    assert_eq!(pool.acquire().await.unwrap_err(), Error::Closed);
}

#[tokio::test]
async fn closed_pool_does_not_reopen() {
    let pool: Pool<u32> = Pool::new();
    pool.add(1);
    pool.open();
    pool.close_now();

    pool.open();
    assert!(!pool.is_open(), "the lifecycle is terminal at closed");
    assert_eq!(pool.acquire().await.unwrap_err(), Error::Closed);
}

#[tokio::test]
async fn close_mid_wait_wakes_parked_acquirer_with_closed() {
    let pool: Pool<u32> = Pool::new();
    pool.open();

    let waiter = {
        let pool = pool.clone();
        tokio::spawn(async move { pool.acquire().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!waiter.is_finished());

    pool.close_now();
    let result = tokio::time::timeout(Duration::from_secs(1), waiter)
        .await
        .expect("close must wake the parked acquirer")
        .expect("acquirer task must not panic");
    assert_eq!(result.unwrap_err(), Error::Closed);
}
