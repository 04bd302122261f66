use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_counter_vec, CounterVec, Encoder,
    HistogramVec, IntCounterVec, TextEncoder,
};

lazy_static! {
    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // Cache Metrics (Redis)
    pub static ref CACHE_OPERATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "cache_operations_total",
        "Total number of cache operations",
        &["operation", "status"]
    )
    .unwrap();

    pub static ref CACHE_HIT_RATIO: CounterVec = register_counter_vec!(
        "cache_hit_ratio",
        "Cache hit/miss ratio",
        &["result"]
    )
    .unwrap();

    pub static ref CACHE_OPERATION_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "cache_operation_duration_seconds",
        "Cache operation duration in seconds",
        &["operation"],
        vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1]
    )
    .unwrap();

    // Business Metrics
    pub static ref QUIZZES_GENERATED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "quizzes_generated_total",
        "Total number of quizzes generated",
        &["difficulty"]
    )
    .unwrap();

    pub static ref QUIZ_ATTEMPTS_SUBMITTED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "quiz_attempts_submitted_total",
        "Total number of quiz attempts submitted",
        &["subject"]
    )
    .unwrap();

    pub static ref LESSONS_GENERATED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "lessons_generated_total",
        "Total number of study lessons generated",
        &["subject"]
    )
    .unwrap();

    pub static ref CERTIFICATES_GENERATED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "certificates_generated_total",
        "Total number of achievement certificates rendered",
        &["subject"]
    )
    .unwrap();

    pub static ref WORD_OF_DAY_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "word_of_day_requests_total",
        "Total number of word-of-day lookups",
        &["source"]
    )
    .unwrap();

    pub static ref NOTIFICATION_WORKER_TICKS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "notification_worker_ticks_total",
        "Total number of notification worker ticks",
        &["status"]
    )
    .unwrap();

    pub static ref NOTIFICATIONS_SENT_TOTAL: IntCounterVec = register_int_counter_vec!(
        "notifications_sent_total",
        "Total number of scheduled-test notification emails",
        &["status"]
    )
    .unwrap();
}

/// Renders all metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("Failed to convert metrics to UTF-8: {}", e)))
}

/// Helper: track cache operation with metrics
pub async fn track_cache_operation<F, T>(operation: &str, future: F) -> Result<T, anyhow::Error>
where
    F: std::future::Future<Output = Result<T, anyhow::Error>>,
{
    let start = std::time::Instant::now();
    let result = future.await;
    let duration = start.elapsed().as_secs_f64();

    let status = if result.is_ok() { "success" } else { "error" };

    CACHE_OPERATIONS_TOTAL
        .with_label_values(&[operation, status])
        .inc();

    CACHE_OPERATION_DURATION_SECONDS
        .with_label_values(&[operation])
        .observe(duration);

    result
}

/// Record cache hit
pub fn record_cache_hit() {
    CACHE_HIT_RATIO.with_label_values(&["hit"]).inc();
}

/// Record cache miss
pub fn record_cache_miss() {
    CACHE_HIT_RATIO.with_label_values(&["miss"]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        // Just verify that all metrics are properly registered
        let _ = HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/health", "200"])
            .get();
    }

    #[test]
    fn test_render_metrics() {
        // Increment a counter to ensure we have some data
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let result = render_metrics();
        assert!(result.is_ok());
        let output = result.unwrap();
        assert!(output.contains("http_requests_total"));
    }
}
