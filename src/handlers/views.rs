use axum::{extract::State, http::StatusCode, response::Html};
use serde::Serialize;
use std::sync::Arc;
use tera::{Context, Tera};
use tracing::{error, instrument};

use crate::app::AppState;
use crate::models::Product;

const HOME_TEMPLATE: &str = "home.html";

/// Compiled page templates. Names ending in `.html` are autoescaped.
#[derive(Debug, Clone)]
pub struct PageTemplates {
    engine: Arc<Tera>,
}

/// Listing row with the price already formatted for display
#[derive(Debug, Serialize)]
struct ProductRow<'a> {
    id: &'a str,
    name: &'a str,
    category: &'a str,
    description: Option<&'a str>,
    price: String,
    availability: &'a str,
    stock: u32,
}

impl<'a> From<&'a Product> for ProductRow<'a> {
    fn from(product: &'a Product) -> Self {
        Self {
            id: &product.id,
            name: &product.name,
            category: &product.category,
            description: product.description.as_deref(),
            price: format!("{:.2}", product.price),
            availability: product.availability.as_str(),
            stock: product.stock,
        }
    }
}

impl PageTemplates {
    /// Templates compiled into the binary
    pub fn new() -> tera::Result<Self> {
        let mut engine = Tera::default();
        engine.add_raw_template(
            HOME_TEMPLATE,
            include_str!("../../templates/home.html"),
        )?;
        Ok(Self {
            engine: Arc::new(engine),
        })
    }

    pub fn render_home(&self, products: &[Product]) -> tera::Result<String> {
        let rows: Vec<ProductRow<'_>> = products.iter().map(ProductRow::from).collect();

        let mut context = Context::new();
        context.insert("products", &rows);
        self.engine.render(HOME_TEMPLATE, &context)
    }
}

/// Server-rendered product listing
#[instrument(name = "home_page", skip(state))]
pub async fn home(State(state): State<AppState>) -> Result<Html<String>, (StatusCode, Html<String>)> {
    let products = state.product_service.list_all().await.map_err(|e| {
        error!(error = %e, "Failed to load products for listing page");
        page_error("Failed to load products")
    })?;

    state
        .templates
        .render_home(&products)
        .map(Html)
        .map_err(|e| {
            error!(error = %e, "Failed to render listing page");
            page_error("Failed to render products")
        })
}

fn page_error(message: &str) -> (StatusCode, Html<String>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(format!("<h1>{}</h1>", message)),
    )
}
