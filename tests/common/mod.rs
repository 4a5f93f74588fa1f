#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::RwLock;

use storefront_rs::{
    create_app,
    handlers::PageTemplates,
    models::{Cart, Product, RepositoryError, RepositoryResult},
    repositories::{CartRepository, ProductRepository},
    services::{CartService, ListenerRegistry, ProductService},
    AppOptions, AppState, Metrics,
};

/// Products kept in insertion order, with a switch to simulate store outages
#[derive(Default)]
pub struct InMemoryProductRepository {
    products: RwLock<Vec<Product>>,
    failing: AtomicBool,
}

impl InMemoryProductRepository {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> RepositoryResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(RepositoryError::ConnectionFailed)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn find_all(&self) -> RepositoryResult<Vec<Product>> {
        self.check()?;
        Ok(self.products.read().await.clone())
    }

    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Product>> {
        self.check()?;
        Ok(self
            .products
            .read()
            .await
            .iter()
            .find(|product| product.id == id)
            .cloned())
    }

    async fn create(&self, product: Product) -> RepositoryResult<Product> {
        self.check()?;
        self.products.write().await.push(product.clone());
        Ok(product)
    }

    async fn update(&self, product: Product) -> RepositoryResult<Product> {
        self.check()?;
        let mut products = self.products.write().await;
        match products.iter_mut().find(|existing| existing.id == product.id) {
            Some(existing) => {
                *existing = product.clone();
                Ok(product)
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn delete(&self, id: &str) -> RepositoryResult<bool> {
        self.check()?;
        let mut products = self.products.write().await;
        let before = products.len();
        products.retain(|product| product.id != id);
        Ok(products.len() != before)
    }
}

#[derive(Default)]
pub struct InMemoryCartRepository {
    carts: RwLock<HashMap<String, Cart>>,
}

#[async_trait]
impl CartRepository for InMemoryCartRepository {
    async fn find_cart(&self, id: &str) -> RepositoryResult<Option<Cart>> {
        Ok(self.carts.read().await.get(id).cloned())
    }

    async fn save_cart(&self, cart: Cart) -> RepositoryResult<Cart> {
        self.carts
            .write()
            .await
            .insert(cart.id.clone(), cart.clone());
        Ok(cart)
    }

    async fn delete_cart(&self, id: &str) -> RepositoryResult<bool> {
        Ok(self.carts.write().await.remove(id).is_some())
    }
}

pub struct TestEnvironment {
    pub client: Client,
    pub base_url: String,
    pub ws_url: String,
    pub products: Arc<InMemoryProductRepository>,
    pub carts: Arc<InMemoryCartRepository>,
    pub listeners: Arc<ListenerRegistry>,
}

impl TestEnvironment {
    pub async fn new() -> Self {
        let products = Arc::new(InMemoryProductRepository::default());
        let carts = Arc::new(InMemoryCartRepository::default());
        let metrics = Arc::new(Metrics::new().expect("Failed to create metrics"));
        let listeners = Arc::new(ListenerRegistry::with_metrics(metrics.clone()));

        let product_service = Arc::new(ProductService::new_with_listeners(
            products.clone(),
            listeners.clone(),
        ));
        let cart_service = Arc::new(CartService::new(carts.clone(), products.clone()));

        let templates = PageTemplates::new().expect("Failed to compile templates");
        let state = AppState::new(
            product_service,
            cart_service,
            listeners.clone(),
            metrics,
            templates,
        );
        let app = create_app(
            state,
            AppOptions {
                request_timeout: Duration::from_secs(10),
                max_request_size: 64 * 1024,
                static_dir: concat!(env!("CARGO_MANIFEST_DIR"), "/public").to_string(),
            },
        );

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind listener");
        let addr = listener.local_addr().expect("Failed to get local address");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Failed to serve app");
        });

        Self {
            client: Client::new(),
            base_url: format!("http://{}", addr),
            ws_url: format!("ws://{}/ws", addr),
            products,
            carts,
            listeners,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn create_product(&self, name: &str, category: &str, price: f64) -> Product {
        let response = self
            .client
            .post(self.url("/api/products"))
            .json(&product_body(name, category, price))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.expect("Failed to parse product")
    }

    pub async fn create_cart(&self) -> Cart {
        let response = self
            .client
            .post(self.url("/api/carts"))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.expect("Failed to parse cart")
    }
}

pub fn product_body(name: &str, category: &str, price: f64) -> Value {
    json!({
        "name": name,
        "category": category,
        "price": price,
        "stock": 10,
    })
}
