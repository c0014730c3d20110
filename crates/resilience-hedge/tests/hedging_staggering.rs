use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use resilience_core::{ExecutionContext, FnNext, Next, Outcome, PinFuture, ResilienceStrategy};
use resilience_hedge::{Hedge, HedgeConfigBuilder, HedgeDelay};

#[tokio::test]
async fn hedges_fire_at_roughly_one_hundred_and_two_hundred_millis_and_the_winner_finishes_first() {
    let config = HedgeConfigBuilder::<i32, String>::new("demo")
        .max_attempts(3)
        .delay(HedgeDelay::linear(Duration::from_millis(100), Duration::from_millis(100)))
        .build()
        .unwrap();
    let hedge = Hedge::new(config);

    let start = Instant::now();
    let starts = Arc::new(std::sync::Mutex::new(Vec::new()));
    let starts_clone = starts.clone();
    let attempt_count = Arc::new(AtomicUsize::new(0));
    let attempt_count_clone = attempt_count.clone();

    let next: Arc<dyn Next<i32, String>> = Arc::new(FnNext::new(move |context: ExecutionContext| {
        let starts = starts_clone.clone();
        let attempt_count = attempt_count_clone.clone();
        Box::pin(async move {
            let attempt = attempt_count.fetch_add(1, Ordering::SeqCst);
            starts.lock().unwrap().push((attempt, start.elapsed()));
            // Only the third attempt (spawned near t=200ms) ever succeeds.
            if attempt == 2 {
                (Outcome::Result(attempt as i32), context)
            } else {
                tokio::time::sleep(Duration::from_secs(5)).await;
                (Outcome::Result(attempt as i32), context)
            }
        }) as PinFuture<(Outcome<i32, String>, ExecutionContext)>
    }));

    let (outcome, _) = hedge.execute(next, ExecutionContext::new()).await;
    assert!(matches!(outcome, Outcome::Result(2)));

    let recorded = starts.lock().unwrap().clone();
    assert_eq!(recorded.len(), 3);
    let (_, t0) = recorded[0];
    let (_, t1) = recorded[1];
    let (_, t2) = recorded[2];
    assert!(t0 < Duration::from_millis(20));
    assert!(t1 >= Duration::from_millis(90) && t1 < Duration::from_millis(250));
    assert!(t2 >= Duration::from_millis(190) && t2 < Duration::from_millis(450));
}
