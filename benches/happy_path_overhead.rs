//! Measures the per-call overhead each pattern adds on its happy path: the callback
//! always succeeds immediately, so every nanosecond counted here is pipeline bookkeeping
//! rather than real work.

use criterion::{criterion_group, criterion_main, Criterion};
use resilience::core::{ExecutionContext, Outcome, PinFuture, ResilienceError, ResiliencePipelineBuilder};
use resilience::{BulkheadConfigBuilder, CircuitBreakerConfigBuilder, PipelineBuilderExt, RetryConfigBuilder};
use std::hint::black_box;
use std::time::Duration;
use tokio::runtime::Runtime;

#[derive(Clone, Debug)]
struct BenchError;

impl std::fmt::Display for BenchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bench error")
    }
}

impl std::error::Error for BenchError {}

fn succeed(ctx: ExecutionContext) -> PinFuture<(Outcome<u64, ResilienceError<BenchError>>, ExecutionContext)> {
    Box::pin(async move { (Outcome::Result(black_box(1)), ctx) })
}

fn bench_pipeline(c: &mut Criterion, name: &str, builder: &mut ResiliencePipelineBuilder<u64, ResilienceError<BenchError>>) {
    let pipeline = builder.build();
    let rt = Runtime::new().unwrap();

    c.bench_function(name, |b| {
        b.to_async(&rt).iter(|| {
            let pipeline = pipeline.clone();
            async move { black_box(pipeline.execute(succeed, ExecutionContext::new()).await) }
        });
    });
}

fn baseline(c: &mut Criterion) {
    let mut builder: ResiliencePipelineBuilder<u64, ResilienceError<BenchError>> = ResiliencePipelineBuilder::new();
    bench_pipeline(c, "baseline_no_strategies", &mut builder);
}

fn retry_only(c: &mut Criterion) {
    let retry = RetryConfigBuilder::<u64, BenchError>::new("bench-retry").max_attempts(3).build().unwrap();
    let mut builder: ResiliencePipelineBuilder<u64, ResilienceError<BenchError>> = ResiliencePipelineBuilder::new();
    builder.add_retry(retry);
    bench_pipeline(c, "retry_happy_path", &mut builder);
}

fn circuit_breaker_closed(c: &mut Criterion) {
    let cb = CircuitBreakerConfigBuilder::new().name("bench-cb").minimum_number_of_calls(2).build().unwrap();
    let mut builder: ResiliencePipelineBuilder<u64, ResilienceError<BenchError>> = ResiliencePipelineBuilder::new();
    builder.add_circuit_breaker(cb);
    bench_pipeline(c, "circuit_breaker_closed_path", &mut builder);
}

fn timeout_only(c: &mut Criterion) {
    let mut builder: ResiliencePipelineBuilder<u64, ResilienceError<BenchError>> = ResiliencePipelineBuilder::new();
    builder.add_timeout(Duration::from_secs(5));
    bench_pipeline(c, "timeout_happy_path", &mut builder);
}

fn bulkhead_uncontended(c: &mut Criterion) {
    let bulkhead = BulkheadConfigBuilder::new().max_parallelization(64).build().unwrap();
    let mut builder: ResiliencePipelineBuilder<u64, ResilienceError<BenchError>> = ResiliencePipelineBuilder::new();
    builder.add_bulkhead(bulkhead);
    bench_pipeline(c, "bulkhead_uncontended", &mut builder);
}

fn full_stack(c: &mut Criterion) {
    let retry = RetryConfigBuilder::<u64, BenchError>::new("bench-full-retry").max_attempts(3).build().unwrap();
    let cb = CircuitBreakerConfigBuilder::new().name("bench-full-cb").minimum_number_of_calls(2).build().unwrap();
    let bulkhead = BulkheadConfigBuilder::new().max_parallelization(64).build().unwrap();

    let mut builder: ResiliencePipelineBuilder<u64, ResilienceError<BenchError>> = ResiliencePipelineBuilder::new();
    builder.add_retry(retry).add_circuit_breaker(cb).add_bulkhead(bulkhead).add_timeout(Duration::from_secs(5));
    bench_pipeline(c, "full_stack_happy_path", &mut builder);
}

criterion_group!(benches, baseline, retry_only, circuit_breaker_closed, timeout_only, bulkhead_uncontended, full_stack);
criterion_main!(benches);
