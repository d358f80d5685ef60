//! Prometheus metrics for the browser server.

use axum::http::Method;
use prometheus_client::encoding::{EncodeLabelSet, EncodeLabelValue};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{Histogram, exponential_buckets};
use prometheus_client::registry::Registry;

/// Labels for HTTP request metrics.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct HttpLabelsWithStatus {
    pub method: HttpMethod,
    pub endpoint: String,
    pub status: u16,
}

/// HTTP method label value.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum HttpMethod {
    Get,
    Post,
    Options,
    Other,
}

impl From<&Method> for HttpMethod {
    fn from(method: &Method) -> Self {
        match *method {
            Method::GET => HttpMethod::Get,
            Method::POST => HttpMethod::Post,
            Method::OPTIONS => HttpMethod::Options,
            _ => HttpMethod::Other,
        }
    }
}

/// Labels for the latency histogram. Status is unknown when timing starts.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct HttpLabels {
    pub method: HttpMethod,
    pub endpoint: String,
}

/// Container for all Prometheus metrics.
pub struct Metrics {
    registry: Registry,

    /// Records returned by record pages.
    pub browser_records_scanned_total: Counter,

    /// Record pages served.
    pub browser_scan_pages_total: Counter,

    /// Set listings served, cached or not.
    pub browser_set_listings_total: Counter,

    /// Schema summaries produced.
    pub browser_summaries_total: Counter,

    pub http_requests_total: Family<HttpLabelsWithStatus, Counter>,

    pub http_request_duration_seconds: Family<HttpLabels, Histogram>,

    pub http_requests_in_flight: Gauge,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Create a new metrics registry with all metrics registered.
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let browser_records_scanned_total = Counter::default();
        registry.register(
            "browser_records_scanned_total",
            "Total number of records returned by set scans",
            browser_records_scanned_total.clone(),
        );

        let browser_scan_pages_total = Counter::default();
        registry.register(
            "browser_scan_pages_total",
            "Total number of record pages served",
            browser_scan_pages_total.clone(),
        );

        let browser_set_listings_total = Counter::default();
        registry.register(
            "browser_set_listings_total",
            "Total number of set listings served",
            browser_set_listings_total.clone(),
        );

        let browser_summaries_total = Counter::default();
        registry.register(
            "browser_summaries_total",
            "Total number of schema summaries produced",
            browser_summaries_total.clone(),
        );

        let http_requests_total = Family::<HttpLabelsWithStatus, Counter>::default();
        registry.register(
            "http_requests_total",
            "Total number of HTTP requests",
            http_requests_total.clone(),
        );

        // Buckets from 1ms to ~8s; summaries dominate the upper end.
        let http_request_duration_seconds =
            Family::<HttpLabels, Histogram>::new_with_constructor(|| {
                Histogram::new(exponential_buckets(0.001, 2.0, 14))
            });
        registry.register(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
            http_request_duration_seconds.clone(),
        );

        let http_requests_in_flight = Gauge::default();
        registry.register(
            "http_requests_in_flight",
            "Number of HTTP requests currently being processed",
            http_requests_in_flight.clone(),
        );

        Self {
            registry,
            browser_records_scanned_total,
            browser_scan_pages_total,
            browser_set_listings_total,
            browser_summaries_total,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
        }
    }

    /// Encode all metrics to Prometheus text format.
    pub fn encode(&self) -> String {
        let mut buffer = String::new();
        if let Err(e) = prometheus_client::encoding::text::encode(&mut buffer, &self.registry) {
            tracing::error!(error = %e, "failed to encode metrics");
        }
        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_register_browser_and_http_metrics() {
        // given/when
        let metrics = Metrics::new();

        // then
        let encoded = metrics.encode();
        assert!(encoded.contains("# HELP browser_records_scanned_total"));
        assert!(encoded.contains("# HELP browser_scan_pages_total"));
        assert!(encoded.contains("# HELP browser_set_listings_total"));
        assert!(encoded.contains("# HELP browser_summaries_total"));
        assert!(encoded.contains("# HELP http_requests_total"));
        assert!(encoded.contains("# HELP http_request_duration_seconds"));
        assert!(encoded.contains("# HELP http_requests_in_flight"));
    }

    #[test]
    fn should_count_scanned_records() {
        // given
        let metrics = Metrics::new();

        // when
        metrics.browser_records_scanned_total.inc_by(100);
        metrics.browser_scan_pages_total.inc();

        // then
        let encoded = metrics.encode();
        assert!(encoded.contains("browser_records_scanned_total 100"));
        assert!(encoded.contains("browser_scan_pages_total 1"));
    }

    #[test]
    fn should_convert_http_method_to_label() {
        // when/then
        assert!(matches!(HttpMethod::from(&Method::GET), HttpMethod::Get));
        assert!(matches!(HttpMethod::from(&Method::POST), HttpMethod::Post));
        assert!(matches!(HttpMethod::from(&Method::PUT), HttpMethod::Other));
    }
}
