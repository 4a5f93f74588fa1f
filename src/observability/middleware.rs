use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use opentelemetry::trace::TraceContextExt;
use std::future::Future;
use std::{sync::Arc, time::Instant};
use tracing::{error, info, instrument, warn, Instrument};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use super::Metrics;

/// Middleware for automatic request tracing and metrics collection
pub async fn observability_middleware(
    metrics: Arc<Metrics>,
    request: Request,
    next: Next,
) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();
    let uri = request.uri().to_string();

    let user_agent = request
        .headers()
        .get("user-agent")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    // Group by route template so identifiers do not explode label cardinality
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched_path| matched_path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let span_name = format!("{} {}", method, endpoint);
    let span = tracing::info_span!(
        target: "storefront_rs::http",
        "{}", span_name,
        otel.name = %span_name,
        otel.kind = "server",
        http.method = %method,
        http.route = %endpoint,
        http.url = %uri,
        http.user_agent = %user_agent,
        http.status_code = tracing::field::Empty,
        http.response_time_ms = tracing::field::Empty,
    );

    async {
        metrics.increment_in_flight(&method, &endpoint);

        let trace_id = tracing::Span::current()
            .context()
            .span()
            .span_context()
            .trace_id()
            .to_string();

        info!(trace_id = %trace_id, method = %method, path = %uri, "Processing request");

        let response = next.run(request).await;

        let duration = start_time.elapsed();
        let duration_ms = duration.as_millis();
        let status_code = response.status().as_u16();

        let current_span = tracing::Span::current();
        current_span.record("http.status_code", status_code);
        current_span.record("http.response_time_ms", duration_ms);
        if status_code >= 500 {
            current_span
                .context()
                .span()
                .set_status(opentelemetry::trace::Status::error("HTTP error"));
        }

        metrics.record_http_request(&method, &endpoint, status_code, duration.as_secs_f64());
        metrics.decrement_in_flight(&method, &endpoint);

        if status_code >= 500 {
            error!(trace_id = %trace_id, method = %method, path = %uri, status_code, duration_ms, "Request failed");
        } else if status_code >= 400 {
            warn!(trace_id = %trace_id, method = %method, path = %uri, status_code, duration_ms, "Request rejected");
        } else {
            info!(trace_id = %trace_id, method = %method, path = %uri, status_code, duration_ms, "Request completed");
        }

        response
    }
    .instrument(span)
    .await
}

/// Wraps product and cart operations with a span and an outcome counter
pub struct BusinessTracingMiddleware {
    metrics: Arc<Metrics>,
}

impl BusinessTracingMiddleware {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self { metrics }
    }

    #[instrument(skip_all, fields(operation = %operation, product_id = product_id))]
    pub async fn trace_product_operation<F, T, E>(
        &self,
        operation: &str,
        product_id: Option<&str>,
        future: F,
    ) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let result = timed("Product", future).await;
        self.metrics
            .record_product_operation(operation, result.is_ok());
        result
    }

    #[instrument(skip_all, fields(operation = %operation, cart_id = cart_id))]
    pub async fn trace_cart_operation<F, T, E>(
        &self,
        operation: &str,
        cart_id: Option<&str>,
        future: F,
    ) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let result = timed("Cart", future).await;
        self.metrics.record_cart_operation(operation, result.is_ok());
        result
    }
}

async fn timed<F, T, E>(kind: &str, future: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let start_time = Instant::now();

    match future.await {
        Ok(result) => {
            info!(
                duration_ms = start_time.elapsed().as_millis(),
                "{} operation completed", kind
            );
            Ok(result)
        }
        Err(error) => {
            warn!(
                error = %error,
                duration_ms = start_time.elapsed().as_millis(),
                "{} operation failed", kind
            );
            Err(error)
        }
    }
}
