use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::AvailabilityStatus;

/// Catalog product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub availability: AvailabilityStatus,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub stock: u32,
    /// Free-form descriptive payload stored alongside the product
    pub attributes: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request model for creating a new product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: String,
    #[serde(default)]
    pub availability: AvailabilityStatus,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

/// Request model for a partial product update; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProductRequest {
    #[serde(default)]
    pub name: Option<String>,
    /// `Some(None)` (an explicit `null`) clears the description
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub availability: Option<AvailabilityStatus>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub stock: Option<u32>,
    #[serde(default)]
    pub attributes: Option<Map<String, Value>>,
}

impl Product {
    /// Create a new product with a store-assigned identifier
    pub fn new(request: CreateProductRequest) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: request.name.trim().to_string(),
            description: request.description,
            category: request.category.trim().to_string(),
            availability: request.availability,
            price: request.price,
            stock: request.stock,
            attributes: request.attributes,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the fields present in the request
    pub fn apply_update(&mut self, request: UpdateProductRequest) {
        if let Some(name) = request.name {
            self.name = name.trim().to_string();
        }
        if let Some(description) = request.description {
            self.description = description;
        }
        if let Some(category) = request.category {
            self.category = category.trim().to_string();
        }
        if let Some(availability) = request.availability {
            self.availability = availability;
        }
        if let Some(price) = request.price {
            self.price = price;
        }
        if let Some(stock) = request.stock {
            self.stock = stock;
        }
        if let Some(attributes) = request.attributes {
            self.attributes = attributes;
        }
        self.updated_at = Utc::now();
    }

    /// Case-insensitive substring match against category or availability.
    ///
    /// `needle` must already be lowercased.
    pub fn matches_query(&self, needle: &str) -> bool {
        self.category.to_lowercase().contains(needle)
            || self.availability.as_str().contains(needle)
    }
}
