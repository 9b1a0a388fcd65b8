//! Basic pool usage
//!
//! A few workers borrow connections from a shared pool, then the pool is
//! drained and closed gracefully.

use std::time::Duration;

use corral_pool::Pool;

#[tokio::main]
async fn main() {
    let pool: Pool<String> = Pool::new();
    for i in 0..3 {
        pool.add(format!("conn-{i}"));
    }
    pool.open();

    let mut workers = Vec::new();
    for id in 0..8 {
        let pool = pool.clone();
        workers.push(tokio::spawn(async move {
            for _ in 0..5 {
                let conn = pool
                    .acquire_timeout(Duration::from_secs(1))
                    .await
                    .expect("pool is open with connections");
                println!("worker {id} using {conn}");
                tokio::time::sleep(Duration::from_millis(10)).await;
                pool.release(conn).expect("connection came from this pool");
            }
        }));
    }
    for worker in workers {
        worker.await.expect("worker should finish");
    }

    pool.close().await;
    println!("pool drained and closed: {pool:?}");
}
