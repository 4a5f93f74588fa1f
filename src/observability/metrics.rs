use prometheus::{
    CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, IntCounter, IntGauge, Opts,
    Registry, TextEncoder,
};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Failed to register metric: {0}")]
    Registration(#[from] prometheus::Error),
    #[error("Failed to encode metrics: {0}")]
    Encoding(String),
}

/// Prometheus metrics for the storefront service
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,

    // HTTP metrics
    pub http_requests_total: CounterVec,
    pub http_request_duration_seconds: HistogramVec,
    pub http_requests_in_flight: GaugeVec,

    // Business metrics
    pub product_operations_total: CounterVec,
    pub cart_operations_total: CounterVec,

    // Live updates
    pub socket_listeners: IntGauge,
    pub socket_broadcasts_total: IntCounter,
}

impl Metrics {
    /// Create a new metrics instance with its own registry
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let http_requests_total = CounterVec::new(
            Opts::new(
                "http_requests_total",
                "Total number of HTTP requests processed",
            ),
            &["method", "endpoint", "status_code"],
        )?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request duration in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ]),
            &["method", "endpoint"],
        )?;

        let http_requests_in_flight = GaugeVec::new(
            Opts::new(
                "http_requests_in_flight",
                "Number of HTTP requests currently being processed",
            ),
            &["method", "endpoint"],
        )?;

        let product_operations_total = CounterVec::new(
            Opts::new(
                "product_operations_total",
                "Total number of product operations",
            ),
            &["operation", "status"],
        )?;

        let cart_operations_total = CounterVec::new(
            Opts::new("cart_operations_total", "Total number of cart operations"),
            &["operation", "status"],
        )?;

        let socket_listeners = IntGauge::new(
            "socket_listeners",
            "Number of connected live-update listeners",
        )?;

        let socket_broadcasts_total = IntCounter::new(
            "socket_broadcasts_total",
            "Total number of product snapshots broadcast to listeners",
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(product_operations_total.clone()))?;
        registry.register(Box::new(cart_operations_total.clone()))?;
        registry.register(Box::new(socket_listeners.clone()))?;
        registry.register(Box::new(socket_broadcasts_total.clone()))?;

        info!("Prometheus metrics initialized");

        Ok(Metrics {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
            product_operations_total,
            cart_operations_total,
            socket_listeners,
            socket_broadcasts_total,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encode all metrics in Prometheus text format
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| MetricsError::Encoding(e.to_string()))?;

        String::from_utf8(buffer).map_err(|e| MetricsError::Encoding(e.to_string()))
    }

    pub fn record_http_request(
        &self,
        method: &str,
        endpoint: &str,
        status_code: u16,
        duration_seconds: f64,
    ) {
        let status_str = status_code.to_string();

        self.http_requests_total
            .with_label_values(&[method, endpoint, &status_str])
            .inc();

        self.http_request_duration_seconds
            .with_label_values(&[method, endpoint])
            .observe(duration_seconds);
    }

    pub fn record_product_operation(&self, operation: &str, success: bool) {
        let status = if success { "success" } else { "error" };

        self.product_operations_total
            .with_label_values(&[operation, status])
            .inc();
    }

    pub fn record_cart_operation(&self, operation: &str, success: bool) {
        let status = if success { "success" } else { "error" };

        self.cart_operations_total
            .with_label_values(&[operation, status])
            .inc();
    }

    pub fn set_socket_listeners(&self, count: usize) {
        self.socket_listeners.set(count as i64);
    }

    pub fn record_broadcast(&self) {
        self.socket_broadcasts_total.inc();
    }

    pub fn increment_in_flight(&self, method: &str, endpoint: &str) {
        self.http_requests_in_flight
            .with_label_values(&[method, endpoint])
            .inc();
    }

    pub fn decrement_in_flight(&self, method: &str, endpoint: &str) {
        self.http_requests_in_flight
            .with_label_values(&[method, endpoint])
            .dec();
    }
}
