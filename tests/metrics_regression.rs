//! Metrics regression tests.
//!
//! Metric names and labels are part of the public API: a dashboard or alert built
//! against `bulkhead_calls_rejected_total` breaks silently if the name drifts.

#[cfg(feature = "metrics")]
mod metrics_regression {
    mod bulkhead;
    mod circuitbreaker;

    pub(crate) mod helpers {
        use metrics_util::debugging::{DebugValue, DebuggingRecorder};
        use std::sync::LazyLock;

        pub(crate) static RECORDER: LazyLock<DebuggingRecorder> = LazyLock::new(DebuggingRecorder::default);

        pub(crate) fn init_recorder() {
            let _ = metrics::set_global_recorder(&*RECORDER);
        }

        pub(crate) fn get_metrics_snapshot(
        ) -> Vec<(metrics_util::CompositeKey, Option<metrics::Unit>, Option<metrics::SharedString>, DebugValue)> {
            RECORDER.snapshotter().snapshot().into_vec()
        }

        pub(crate) fn assert_counter_exists(name: &str) {
            let snapshot = get_metrics_snapshot();
            let found = snapshot
                .iter()
                .any(|(composite_key, _, _, value)| composite_key.key().name() == name && matches!(value, DebugValue::Counter(_)));
            assert!(found, "expected counter '{}' not found in metrics", name);
        }

        pub(crate) fn assert_metric_has_label(name: &str, label_key: &str, label_value: &str) {
            let snapshot = get_metrics_snapshot();
            let found = snapshot.iter().any(|(composite_key, _, _, _)| {
                let key = composite_key.key();
                key.name() == name && key.labels().any(|label| label.key() == label_key && label.value() == label_value)
            });
            assert!(found, "expected metric '{}' with label {}='{}' not found", name, label_key, label_value);
        }
    }
}
