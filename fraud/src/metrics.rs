//! Metrics collection module for the fraud prevention service
//!
//! Collects request counts, latencies and fraud-check outcomes and exposes
//! them through Prometheus.

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, HistogramOpts, HistogramVec, Opts, Registry};
use std::time::Instant;

lazy_static! {
    /// Global Prometheus registry instance
    pub static ref REGISTRY_INSTANCE: Registry = Registry::new();

    /// Counter for tracking request counts by method
    pub static ref REQ_COUNTER_VEC: CounterVec =
        CounterVec::new(Opts::new("request_counter", "request counter"), &["method"]).unwrap();

    /// Histogram for tracking method execution times
    pub static ref METHOD_HISTOGRAM_VEC: HistogramVec = HistogramVec::new(
        HistogramOpts::new("method_cost", "method cost"),
        &["method"]
    )
    .unwrap();

    /// Purchases returned as part of a fraudulent pair
    pub static ref FLAGGED_COUNTER: Counter =
        Counter::new("flagged_purchases", "purchases flagged as fraudulent").unwrap();

    /// Failed fraud checks by reason
    pub static ref REJECT_COUNTER_VEC: CounterVec = CounterVec::new(
        Opts::new("rejected_requests", "rejected fraud check requests"),
        &["reason"]
    )
    .unwrap();
}

/// Registers all metric collectors with the global registry
pub fn init_registry() {
    let _ = REGISTRY_INSTANCE.register(Box::new(REQ_COUNTER_VEC.clone()));
    let _ = REGISTRY_INSTANCE.register(Box::new(METHOD_HISTOGRAM_VEC.clone()));
    let _ = REGISTRY_INSTANCE.register(Box::new(FLAGGED_COUNTER.clone()));
    let _ = REGISTRY_INSTANCE.register(Box::new(REJECT_COUNTER_VEC.clone()));
}

/// Counts the call to `method_name` and records how long `handler` took.
pub async fn record_metrics<F, Fut, T, E>(method_name: &'static str, handler: F) -> Result<T, E>
where
    F: FnOnce() -> Fut + Send,
    Fut: std::future::Future<Output = Result<T, E>> + Send,
{
    let start = Instant::now();
    REQ_COUNTER_VEC.with_label_values(&[method_name]).inc();
    let result = handler().await;

    let elapsed = start.elapsed();
    METHOD_HISTOGRAM_VEC
        .with_label_values(&[method_name])
        .observe(elapsed.as_secs_f64());

    result
}

pub fn record_flagged(count: usize) {
    FLAGGED_COUNTER.inc_by(count as f64);
}

pub fn record_rejected(reason: &'static str) {
    REJECT_COUNTER_VEC.with_label_values(&[reason]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_record_metrics_counts_calls() {
        let before = REQ_COUNTER_VEC.with_label_values(&["metrics_test"]).get();
        let result: Result<u32, String> = record_metrics("metrics_test", || async { Ok(3) }).await;
        assert_eq!(result, Ok(3));
        let after = REQ_COUNTER_VEC.with_label_values(&["metrics_test"]).get();
        assert_eq!(after - before, 1.0);
        assert!(
            METHOD_HISTOGRAM_VEC
                .with_label_values(&["metrics_test"])
                .get_sample_count()
                >= 1
        );
    }

    #[test]
    fn test_rejections_are_labelled() {
        let before = REJECT_COUNTER_VEC.with_label_values(&["test_reason"]).get();
        record_rejected("test_reason");
        let after = REJECT_COUNTER_VEC.with_label_values(&["test_reason"]).get();
        assert_eq!(after - before, 1.0);
    }
}
