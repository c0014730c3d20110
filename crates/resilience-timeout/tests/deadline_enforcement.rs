use std::sync::Arc;
use std::time::{Duration, Instant};

use resilience_core::{ExecutionContext, FnNext, Next, Outcome, PinFuture, ResilienceError, ResilienceStrategy};
use resilience_timeout::{Timeout, TimeoutConfig, TimeoutMode};

#[tokio::test]
async fn pessimistic_timeout_around_one_second_abandons_a_stuck_call() {
    let config = TimeoutConfig::builder()
        .timeout_duration(Duration::from_secs(1))
        .mode(TimeoutMode::Pessimistic)
        .build()
        .unwrap();
    let timeout: Timeout<i32, String> = Timeout::new(config);

    let next: Arc<dyn Next<i32, ResilienceError<String>>> = Arc::new(FnNext::new(|context: ExecutionContext| {
        Box::pin(async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            (Outcome::Result(1), context)
        }) as PinFuture<(Outcome<i32, ResilienceError<String>>, ExecutionContext)>
    }));

    let start = Instant::now();
    let (outcome, _) = timeout.execute(next, ExecutionContext::new()).await;
    let elapsed = start.elapsed();

    assert!(matches!(outcome, Outcome::Exception(ResilienceError::TimeoutRejected { elapsed: e }) if e == Duration::from_secs(1)));
    assert!(elapsed >= Duration::from_secs(1) && elapsed < Duration::from_millis(1500), "elapsed was {elapsed:?}");
}
