use serde::{Deserialize, Serialize};

use super::{CreateProductRequest, Product};

/// Messages accepted from live-update clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    NewProduct(CreateProductRequest),
    DeleteProduct(String),
}

/// Messages pushed to live-update clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    UpdateProducts(Vec<Product>),
    Error { message: String },
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::UpdateProducts(_) => "updateProducts",
            ServerEvent::Error { .. } => "error",
        }
    }
}
