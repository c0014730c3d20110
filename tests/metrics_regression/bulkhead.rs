use super::helpers::*;
use resilience::core::{ExecutionContext, Outcome, PinFuture, ResilienceError, ResiliencePipelineBuilder};
use resilience::{BulkheadConfigBuilder, PipelineBuilderExt};
use serial_test::serial;

#[tokio::test]
#[serial]
async fn bulkhead_emits_permitted_and_rejected_counters() {
    init_recorder();

    let bulkhead = BulkheadConfigBuilder::new().name("metrics_bulkhead").max_parallelization(1).max_queuing(0).build().unwrap();
    let mut builder: ResiliencePipelineBuilder<i32, ResilienceError<String>> = ResiliencePipelineBuilder::new();
    builder.add_bulkhead(bulkhead);
    let pipeline = std::sync::Arc::new(builder.build());

    let (release_tx, _) = tokio::sync::broadcast::channel::<()>(1);
    let release_tx = std::sync::Arc::new(release_tx);
    let release_tx_clone = std::sync::Arc::clone(&release_tx);

    let pipeline_clone = std::sync::Arc::clone(&pipeline);
    let occupier = tokio::spawn(async move {
        pipeline_clone
            .execute(
                move |ctx| {
                    let mut rx = release_tx_clone.subscribe();
                    Box::pin(async move {
                        let _ = rx.recv().await;
                        (Outcome::Result(1), ctx)
                    }) as PinFuture<_>
                },
                ExecutionContext::new(),
            )
            .await
    });

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let _ = pipeline
        .execute(|ctx| Box::pin(async move { (Outcome::Result(2), ctx) }) as PinFuture<_>, ExecutionContext::new())
        .await;

    let _ = release_tx.send(());
    let _ = occupier.await.unwrap();

    assert_counter_exists("bulkhead_calls_permitted_total");
    assert_counter_exists("bulkhead_calls_rejected_total");
    assert_metric_has_label("bulkhead_calls_permitted_total", "bulkhead", "metrics_bulkhead");
    assert_metric_has_label("bulkhead_calls_rejected_total", "bulkhead", "metrics_bulkhead");
}
