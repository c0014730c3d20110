use super::helpers::*;
use resilience::core::{ExecutionContext, Outcome, PinFuture, ResilienceError};
use resilience::{CircuitBreaker, CircuitBreakerConfigBuilder};
use resilience_core::{FnNext, Next, ResilienceStrategy};
use serial_test::serial;
use std::sync::Arc;

#[tokio::test]
#[serial]
async fn circuit_breaker_emits_call_and_transition_counters() {
    init_recorder();

    let config = CircuitBreakerConfigBuilder::new()
        .name("metrics_breaker")
        .minimum_number_of_calls(1)
        .failure_rate_threshold(0.5)
        .build()
        .unwrap();
    let breaker: CircuitBreaker<i32, String> = CircuitBreaker::new(config);

    let failing: Arc<dyn Next<i32, ResilienceError<String>>> = Arc::new(FnNext::new(|context: ExecutionContext| {
        Box::pin(async move { (Outcome::Exception(ResilienceError::Inner("boom".to_string())), context) }) as PinFuture<_>
    }));
    let _ = breaker.execute(failing, ExecutionContext::new()).await;

    assert_counter_exists("circuitbreaker_calls_total");
    assert_counter_exists("circuitbreaker_transitions_total");
    assert_metric_has_label("circuitbreaker_calls_total", "circuitbreaker", "metrics_breaker");
    assert_metric_has_label("circuitbreaker_transitions_total", "to", "open");
}
