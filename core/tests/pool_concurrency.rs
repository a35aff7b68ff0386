//! Concurrency and model-based tests for `BoundedTicketPool`.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use ticket_pool_core::{
    ActionKind, AddOutcome, BoundedTicketPool, RetrieveOutcome, ShutdownListener, ShutdownSignal,
    replay,
};
use tokio_test::{assert_pending, task};

// ============================================================================
// Concurrent actors
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_and_retrieves_stay_bounded() {
    const CAPACITY: u32 = 21;
    const BATCH: u32 = 3;
    const VENDORS: u32 = 8;
    const ADDS_PER_VENDOR: u32 = 50;
    const CUSTOMERS: u32 = 4;
    const RETRIEVES_PER_CUSTOMER: u32 = VENDORS * ADDS_PER_VENDOR / CUSTOMERS;

    let pool = Arc::new(BoundedTicketPool::new(0, CAPACITY).unwrap());
    let mut handles = Vec::new();

    for v in 1..=VENDORS {
        let pool = Arc::clone(&pool);
        handles.push(tokio::spawn(async move {
            let name = format!("Vendor-{v}");
            let mut never = ShutdownListener::never();
            for _ in 0..ADDS_PER_VENDOR {
                let outcome = pool.add(BATCH, &name, &mut never).await.unwrap();
                assert!(outcome.is_committed());
            }
        }));
    }

    for c in 1..=CUSTOMERS {
        let pool = Arc::clone(&pool);
        handles.push(tokio::spawn(async move {
            let name = format!("Customer-{c}");
            let mut bought = 0;
            while bought < RETRIEVES_PER_CUSTOMER {
                match pool.retrieve(BATCH, &name).await.unwrap() {
                    RetrieveOutcome::Retrieved { remaining_after } => {
                        assert!(remaining_after <= CAPACITY);
                        bought += 1;
                    }
                    RetrieveOutcome::Insufficient { available, .. } => {
                        assert!(available < BATCH);
                        tokio::task::yield_now().await;
                    }
                }
            }
        }));
    }

    tokio::time::timeout(Duration::from_secs(30), async {
        for handle in handles {
            handle.await.unwrap();
        }
    })
    .await
    .expect("actors should finish without deadlock");

    let (current, records) = pool.snapshot().await;
    let total_adds = u64::from(VENDORS * ADDS_PER_VENDOR * BATCH);

    assert_eq!(current, 0);
    assert_eq!(records.len(), (VENDORS * ADDS_PER_VENDOR * 2) as usize);
    assert!(records.iter().all(|r| r.remaining_after() <= CAPACITY));
    assert_eq!(replay(0, CAPACITY, &records), Ok(0));

    let added: u64 = records
        .iter()
        .filter(|r| r.action_kind() == ActionKind::Add)
        .map(|r| u64::from(r.count()))
        .sum();
    assert_eq!(added, total_adds);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shutdown_releases_every_blocked_adder() {
    let pool = Arc::new(BoundedTicketPool::new(10, 10).unwrap());
    let signal = ShutdownSignal::new();

    let handles: Vec<_> = (1..=5)
        .map(|v| {
            let pool = Arc::clone(&pool);
            let mut listener = signal.listener();
            tokio::spawn(async move {
                pool.add(v, &format!("Vendor-{v}"), &mut listener)
                    .await
                    .unwrap()
            })
        })
        .collect();

    tokio::time::sleep(Duration::from_millis(50)).await;
    signal.trigger();

    for handle in handles {
        let outcome = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("blocked add should observe shutdown")
            .unwrap();
        assert_eq!(outcome, AddOutcome::Cancelled);
    }

    assert_eq!(pool.current_count().await, 10);
    assert_eq!(pool.transaction_count().await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_one_retrieve_admits_only_what_fits() {
    let pool = Arc::new(BoundedTicketPool::new(10, 10).unwrap());

    let waiters: Vec<_> = (1..=3)
        .map(|v| {
            let pool = Arc::clone(&pool);
            tokio::spawn(async move {
                let mut never = ShutdownListener::never();
                pool.add(4, &format!("Vendor-{v}"), &mut never).await
            })
        })
        .collect();

    tokio::time::sleep(Duration::from_millis(50)).await;
    pool.retrieve(5, "Customer-1").await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Room for exactly one batch of 4; the others keep waiting.
    assert_eq!(pool.current_count().await, 9);
    let finished = waiters.iter().filter(|handle| handle.is_finished()).count();
    assert_eq!(finished, 1);

    for handle in waiters {
        handle.abort();
    }
}

// ============================================================================
// Sequential model
// ============================================================================

#[derive(Debug, Clone)]
enum Op {
    Add(u32),
    Retrieve(u32),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![(1u32..=10).prop_map(Op::Add), (1u32..=10).prop_map(Op::Retrieve)]
}

proptest! {
    #[test]
    fn prop_pool_matches_sequential_model(
        initial in 0u32..=20,
        headroom in 1u32..=20,
        ops in prop::collection::vec(arb_op(), 0..60),
    ) {
        let capacity = initial + headroom;
        let pool = BoundedTicketPool::new(initial, capacity).unwrap();
        let mut model = initial;
        let mut committed = 0usize;

        tokio_test::block_on(async {
            for op in &ops {
                match *op {
                    Op::Add(count) if count > capacity => {
                        let mut never = ShutdownListener::never();
                        prop_assert!(pool.add(count, "Vendor-1", &mut never).await.is_err());
                    }
                    Op::Add(count) if model + count > capacity => {
                        let mut never = ShutdownListener::never();
                        let mut add = task::spawn(pool.add(count, "Vendor-1", &mut never));
                        assert_pending!(add.poll());
                    }
                    Op::Add(count) => {
                        let mut never = ShutdownListener::never();
                        let outcome = pool.add(count, "Vendor-1", &mut never).await.unwrap();
                        model += count;
                        committed += 1;
                        prop_assert_eq!(outcome, AddOutcome::Committed { remaining_after: model });
                    }
                    Op::Retrieve(count) => {
                        let outcome = pool.retrieve(count, "Customer-1").await.unwrap();
                        if count <= model {
                            model -= count;
                            committed += 1;
                            prop_assert_eq!(outcome, RetrieveOutcome::Retrieved { remaining_after: model });
                        } else {
                            prop_assert_eq!(
                                outcome,
                                RetrieveOutcome::Insufficient { requested: count, available: model }
                            );
                        }
                    }
                }
                prop_assert!(pool.current_count().await <= capacity);
            }
            Ok(())
        })?;

        let (current, records) = tokio_test::block_on(pool.snapshot());
        prop_assert_eq!(current, model);
        prop_assert_eq!(records.len(), committed);
        prop_assert_eq!(replay(initial, capacity, &records), Ok(model));

        let net: i64 = records.iter().map(|r| r.delta()).sum();
        prop_assert_eq!(net, i64::from(model) - i64::from(initial));
    }
}
