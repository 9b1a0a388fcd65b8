//! Property tests for membership invariants.
//!
//! For arbitrary sequences of add/acquire/release/remove_now, a tracked
//! resource is in exactly one of {available, checked out}, duplicates are
//! refused, and membership is conserved against a model.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use corral_pool::{Error, Pool};
use proptest::prelude::*;

#[derive(Debug, Clone, Copy)]
enum Op {
    Add(u32),
    RemoveNow(u32),
    Acquire,
    Release,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u32..5).prop_map(Op::Add),
        (0u32..5).prop_map(Op::RemoveNow),
        Just(Op::Acquire),
        Just(Op::Release),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn membership_is_conserved(ops in proptest::collection::vec(op_strategy(), 1..40)) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        rt.block_on(async {
            let pool: Pool<u32> = Pool::new();
            pool.open();

            // Model: the set of tracked ids and the ids we currently hold.
            let mut tracked: HashSet<u32> = HashSet::new();
            let mut held: Vec<Arc<u32>> = Vec::new();

            for op in ops {
                match op {
                    Op::Add(id) => {
                        let added = pool.add(id);
                        prop_assert_eq!(added, !tracked.contains(&id), "add refuses duplicates");
                        tracked.insert(id);
                    }
                    Op::RemoveNow(id) => {
                        let removable =
                            tracked.contains(&id) && !held.iter().any(|h| **h == id);
                        prop_assert_eq!(pool.remove_now(&id), removable);
                        if removable {
                            tracked.remove(&id);
                        }
                    }
                    Op::Acquire => {
                        let result = pool.acquire_timeout(Duration::from_millis(5)).await;
                        if tracked.len() > held.len() {
                            let handle = result.expect("a resource was available");
                            prop_assert!(tracked.contains(&*handle));
                            held.push(handle);
                        } else {
                            prop_assert_eq!(
                                result.unwrap_err(),
                                Error::Timeout { waited: Duration::from_millis(5) }
                            );
                        }
                    }
                    Op::Release => {
                        if let Some(handle) = held.pop() {
                            pool.release(handle).expect("held resource must release");
                        }
                    }
                }

                // A tracked resource is in exactly one set, and nothing is
                // tracked that the model does not know about.
                let stats = pool.stats();
                prop_assert_eq!(stats.available + stats.checked_out, tracked.len());
                prop_assert_eq!(stats.checked_out, held.len());
            }

            Ok(())
        })?;
    }
}
