use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Encoder, Histogram,
    IntCounter, IntCounterVec, TextEncoder,
};
use std::time::Instant;

use crate::{ProxyError, Result};

lazy_static! {
    // Inbound request metrics
    pub static ref REQUEST_COUNTER: IntCounterVec = register_int_counter_vec!(
        "proxy_requests_total",
        "Total number of analytics queries received",
        &["mode"]
    ).unwrap();

    pub static ref REQUEST_DURATION: Histogram = register_histogram!(
        "proxy_request_duration_seconds",
        "Inbound request duration in seconds",
        vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0]
    ).unwrap();

    pub static ref UNRESOLVED_METRICS: IntCounter = register_int_counter!(
        "proxy_unresolved_metric_total",
        "Queries whose metric identifier was not in the catalog"
    ).unwrap();

    // Vendor metrics
    pub static ref UPSTREAM_REQUESTS: IntCounterVec = register_int_counter_vec!(
        "proxy_upstream_requests_total",
        "Vendor API calls by outcome",
        &["outcome"]
    ).unwrap();

    pub static ref UPSTREAM_DURATION: Histogram = register_histogram!(
        "proxy_upstream_duration_seconds",
        "Vendor API round trip in seconds",
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0]
    ).unwrap();
}

pub struct RequestTimer {
    start: Instant,
}

impl RequestTimer {
    pub fn new(mode: &str) -> Self {
        REQUEST_COUNTER.with_label_values(&[mode]).inc();
        Self {
            start: Instant::now(),
        }
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        REQUEST_DURATION.observe(duration);
    }
}

pub struct UpstreamTimer {
    start: Instant,
}

impl UpstreamTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for UpstreamTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for UpstreamTimer {
    fn drop(&mut self) {
        UPSTREAM_DURATION.observe(self.start.elapsed().as_secs_f64());
    }
}

pub fn record_upstream(outcome: &str) {
    UPSTREAM_REQUESTS.with_label_values(&[outcome]).inc();
}

pub fn record_unresolved_metric() {
    UNRESOLVED_METRICS.inc();
}

/// Render every registered metric in the Prometheus text format.
pub fn render() -> Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(|e| ProxyError::Internal(format!("Failed to encode metrics: {}", e)))?;
    String::from_utf8(buffer)
        .map_err(|e| ProxyError::Internal(format!("Metrics are not valid UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timers_and_counters_show_up_in_render() {
        {
            let _timer = RequestTimer::new("mapped");
        }
        record_upstream("success");
        record_unresolved_metric();

        let text = render().unwrap();
        assert!(text.contains("proxy_requests_total{mode=\"mapped\"}"));
        assert!(text.contains("proxy_request_duration_seconds_count"));
        assert!(text.contains("proxy_upstream_requests_total{outcome=\"success\"}"));
        assert!(text.contains("proxy_unresolved_metric_total"));
    }
}
