use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, HistogramVec,
    IntCounter, IntCounterVec,
};

lazy_static! {
    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total HTTP requests",
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

    // Error Metrics
    pub static ref STRUCTURED_ERRORS_RENDERED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "structured_errors_rendered_total",
        "Structured errors rendered into responses",
        &["key", "status"]
    )
    .unwrap();

    pub static ref CONTEXT_SUBSTITUTIONS_TOTAL: IntCounter = register_int_counter!(
        "response_context_substitutions_total",
        "Structured errors rendered through a substitute because no response context was attached"
    )
    .unwrap();

    pub static ref FALLBACK_DISPATCHES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "fallback_dispatches_total",
        "Errors handed to the fallback handler",
        &["tag"]
    )
    .unwrap();
}

/// Initialize all metrics (called on startup)
pub fn init_metrics() {
    // Force lazy_static initialization
    lazy_static::initialize(&HTTP_REQUESTS_TOTAL);
    lazy_static::initialize(&HTTP_REQUEST_DURATION_SECONDS);
    lazy_static::initialize(&STRUCTURED_ERRORS_RENDERED_TOTAL);
    lazy_static::initialize(&CONTEXT_SUBSTITUTIONS_TOTAL);
    lazy_static::initialize(&FALLBACK_DISPATCHES_TOTAL);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_registered() {
        init_metrics();
        FALLBACK_DISPATCHES_TOTAL.with_label_values(&["registry_test"]).inc();

        let names: Vec<String> = prometheus::gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.contains(&"fallback_dispatches_total".to_string()));
        assert!(FALLBACK_DISPATCHES_TOTAL.with_label_values(&["registry_test"]).get() >= 1);
    }
}
