use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use resilience_bulkhead::{Bulkhead, BulkheadConfigBuilder};
use resilience_core::{ExecutionContext, FnNext, Next, Outcome, PinFuture, ResilienceError, ResilienceStrategy};

fn holding_next(hold_for: Duration) -> Arc<dyn Next<i32, ResilienceError<String>>> {
    Arc::new(FnNext::new(move |context: ExecutionContext| {
        Box::pin(async move {
            tokio::time::sleep(hold_for).await;
            (Outcome::Result(1), context)
        }) as PinFuture<(Outcome<i32, ResilienceError<String>>, ExecutionContext)>
    }))
}

#[tokio::test]
async fn a_single_slot_bulkhead_with_no_queue_rejects_every_overlapping_caller() {
    let config = BulkheadConfigBuilder::new().max_parallelization(1).max_queuing(0).build().unwrap();
    let bulkhead = Arc::new(Bulkhead::<i32, String>::new(config));

    let holder = bulkhead.clone();
    let holder_task = tokio::spawn(async move { holder.execute(holding_next(Duration::from_millis(80)), ExecutionContext::new()).await });
    tokio::time::sleep(Duration::from_millis(15)).await;

    let rejected = Arc::new(AtomicUsize::new(0));
    let mut overlap_tasks = Vec::new();
    for _ in 0..5 {
        let bulkhead = bulkhead.clone();
        let rejected = rejected.clone();
        overlap_tasks.push(tokio::spawn(async move {
            let (outcome, _) = bulkhead.execute(holding_next(Duration::from_millis(1)), ExecutionContext::new()).await;
            if matches!(outcome, Outcome::Exception(ResilienceError::BulkheadRejected { .. })) {
                rejected.fetch_add(1, Ordering::SeqCst);
            }
        }));
    }
    for task in overlap_tasks {
        task.await.unwrap();
    }
    assert_eq!(rejected.load(Ordering::SeqCst), 5);

    let (outcome, _) = holder_task.await.unwrap();
    assert!(matches!(outcome, Outcome::Result(1)));
}
