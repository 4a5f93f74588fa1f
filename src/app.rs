use axum::{
    extract::FromRef,
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::{sync::Arc, time::Duration};
use tower_http::{services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer};

use crate::handlers::{
    self, carts, cors_middleware, health_check, metrics_handler, products,
    request_validation_middleware, security_headers_middleware, views, ws_handler, PageTemplates,
};
use crate::observability::{observability_middleware, BusinessTracingMiddleware, Metrics};
use crate::services::{CartService, ListenerRegistry, ProductService};

/// Everything a handler can reach, built once in `main`
#[derive(Clone)]
pub struct AppState {
    pub product_service: Arc<ProductService>,
    pub cart_service: Arc<CartService>,
    pub listeners: Arc<ListenerRegistry>,
    pub metrics: Arc<Metrics>,
    pub tracer: Arc<BusinessTracingMiddleware>,
    pub templates: PageTemplates,
}

impl AppState {
    pub fn new(
        product_service: Arc<ProductService>,
        cart_service: Arc<CartService>,
        listeners: Arc<ListenerRegistry>,
        metrics: Arc<Metrics>,
        templates: PageTemplates,
    ) -> Self {
        Self {
            product_service,
            cart_service,
            listeners,
            templates,
            tracer: Arc::new(BusinessTracingMiddleware::new(metrics.clone())),
            metrics,
        }
    }
}

impl FromRef<AppState> for Arc<Metrics> {
    fn from_ref(state: &AppState) -> Self {
        state.metrics.clone()
    }
}

/// HTTP-level settings applied as layers
#[derive(Debug, Clone)]
pub struct AppOptions {
    pub request_timeout: Duration,
    pub max_request_size: u64,
    pub static_dir: String,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_request_size: 1024 * 1024,
            static_dir: "public".to_string(),
        }
    }
}

pub fn create_app(state: AppState, options: AppOptions) -> Router {
    let metrics_for_middleware = state.metrics.clone();
    let max_request_size = options.max_request_size;

    let api = Router::new()
        .route(
            "/api/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/api/products/:product_id",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route("/api/carts", post(carts::create_cart))
        .route(
            "/api/carts/:cart_id",
            get(carts::get_cart).delete(carts::delete_cart),
        )
        .route("/api/carts/:cart_id/products", delete(carts::clear_cart))
        .route(
            "/api/carts/:cart_id/products/:product_id",
            post(carts::add_product)
                .put(carts::set_quantity)
                .delete(carts::remove_product),
        )
        .route("/api/*rest", axum::routing::any(handlers::error::not_found));

    Router::new()
        .route("/health/status", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/", get(views::home))
        .route("/ws", get(ws_handler))
        .merge(api)
        .fallback_service(ServeDir::new(&options.static_dir))
        .with_state(state)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(cors_middleware))
        .layer(middleware::from_fn(move |req, next| {
            request_validation_middleware(max_request_size, req, next)
        }))
        .layer(TimeoutLayer::new(options.request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(move |req, next| {
            observability_middleware(metrics_for_middleware.clone(), req, next)
        }))
}
