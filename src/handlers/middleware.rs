use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::{error, warn};

use super::error::{error_body, ApiError};

/// Request validation middleware. Bodies must be JSON and no larger than
/// `max_request_size` bytes.
pub async fn request_validation_middleware(
    max_request_size: u64,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    validate_request_size(&request, max_request_size)?;
    validate_content_type(&request)?;

    Ok(next.run(request).await)
}

fn declared_length(request: &Request<Body>) -> Option<u64> {
    request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())
}

/// Only requests that carry a body need a JSON content type
fn validate_content_type(request: &Request<Body>) -> Result<(), ApiError> {
    let method = request.method();
    if method != Method::POST && method != Method::PUT && method != Method::PATCH {
        return Ok(());
    }

    let has_body = declared_length(request).map_or(
        request.headers().contains_key(header::TRANSFER_ENCODING),
        |length| length > 0,
    );
    if !has_body {
        return Ok(());
    }

    match request.headers().get(header::CONTENT_TYPE) {
        Some(content_type) => {
            let content_type = content_type.to_str().unwrap_or("");
            if !content_type.starts_with("application/json") {
                warn!("Invalid content type: {}", content_type);
                return Err(error_body(
                    StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    "Content-Type must be application/json",
                ));
            }
            Ok(())
        }
        None => {
            warn!("Missing content type header");
            Err(error_body(
                StatusCode::BAD_REQUEST,
                "Content-Type header is required for requests with body",
            ))
        }
    }
}

fn validate_request_size(request: &Request<Body>, max_request_size: u64) -> Result<(), ApiError> {
    if let Some(length) = declared_length(request) {
        if length > max_request_size {
            error!("Request too large: {} bytes", length);
            return Err(error_body(
                StatusCode::PAYLOAD_TOO_LARGE,
                format!(
                    "Request size {} bytes exceeds maximum of {} bytes",
                    length, max_request_size
                ),
            ));
        }
    }

    Ok(())
}

/// CORS headers for cross-origin API clients
pub async fn cors_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static("86400"),
    );

    response
}

/// Security headers middleware
pub async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    // The listing page opens a socket back to this origin
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'self'; connect-src 'self' ws: wss:"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use axum::{middleware, routing::post, Router};
    use tower::ServiceExt;

    async fn ok_handler() -> &'static str {
        "ok"
    }

    fn app(max_request_size: u64) -> Router {
        Router::new()
            .route("/carts", post(ok_handler))
            .layer(middleware::from_fn(move |req, next| {
                request_validation_middleware(max_request_size, req, next)
            }))
            .layer(middleware::from_fn(security_headers_middleware))
            .layer(middleware::from_fn(cors_middleware))
    }

    #[tokio::test]
    async fn test_post_without_body_needs_no_content_type() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/carts")
            .header(header::CONTENT_LENGTH, "0")
            .body(Body::empty())
            .unwrap();

        let response = app(1024).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::X_FRAME_OPTIONS], "DENY");
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[tokio::test]
    async fn test_body_must_be_json() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/carts")
            .header(header::CONTENT_TYPE, "text/plain")
            .header(header::CONTENT_LENGTH, "5")
            .body(Body::from("hello"))
            .unwrap();

        let response = app(1024).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_missing_content_type_with_body() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/carts")
            .header(header::CONTENT_LENGTH, "2")
            .body(Body::from("{}"))
            .unwrap();

        let response = app(1024).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_oversized_request() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/carts")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CONTENT_LENGTH, "4096")
            .body(Body::from(vec![b' '; 4096]))
            .unwrap();

        let response = app(1024).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
