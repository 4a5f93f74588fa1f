use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Product, ValidationError, ValidationResult, MAX_CART_QUANTITY, MIN_CART_QUANTITY};

/// Shopping cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: String,
    pub products: Vec<CartLineItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A product reference and its quantity inside a cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLineItem {
    pub product: String,
    pub quantity: u32,
}

/// Request model for overwriting a line item quantity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

/// Cart with each line item's product resolved
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartView {
    pub id: String,
    pub products: Vec<CartLineItemView>,
    pub total_items: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Resolved line item. `product` is `None` when the referenced product no
/// longer exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLineItemView {
    pub product_id: String,
    pub product: Option<Product>,
    pub quantity: u32,
}

/// Response for cart mutations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartMutationResponse {
    pub message: String,
    pub cart: Cart,
}

impl Cart {
    /// Create a new empty cart
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            products: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Increment the line item for `product_id`, or append one with quantity 1.
    ///
    /// Returns the new quantity. A line item already at `MAX_CART_QUANTITY`
    /// is rejected and the cart is left untouched.
    pub fn add_product(&mut self, product_id: &str) -> ValidationResult<u32> {
        let quantity = match self.products.iter_mut().find(|line| line.product == product_id) {
            Some(line) if line.quantity >= MAX_CART_QUANTITY => {
                return Err(ValidationError::OutOfRange {
                    field: "quantity".to_string(),
                    min: MIN_CART_QUANTITY.to_string(),
                    max: MAX_CART_QUANTITY.to_string(),
                    value: (u64::from(line.quantity) + 1).to_string(),
                });
            }
            Some(line) => {
                line.quantity += 1;
                line.quantity
            }
            None => {
                self.products.push(CartLineItem {
                    product: product_id.to_string(),
                    quantity: 1,
                });
                1
            }
        };
        self.updated_at = Utc::now();
        Ok(quantity)
    }

    /// Drop the line item for `product_id`. Returns whether one was removed;
    /// an absent product leaves the cart untouched.
    pub fn remove_product(&mut self, product_id: &str) -> bool {
        let original_len = self.products.len();
        self.products.retain(|line| line.product != product_id);
        let removed = self.products.len() != original_len;
        if removed {
            self.updated_at = Utc::now();
        }
        removed
    }

    /// Overwrite the quantity of an existing line item.
    /// Returns false when the product is not in the cart.
    pub fn set_quantity(&mut self, product_id: &str, quantity: u32) -> bool {
        match self.products.iter_mut().find(|line| line.product == product_id) {
            Some(line) => {
                line.quantity = quantity;
                self.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Remove every line item
    pub fn clear(&mut self) {
        self.products.clear();
        self.updated_at = Utc::now();
    }

    pub fn total_items(&self) -> u32 {
        self.products.iter().map(|line| line.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn contains_product(&self, product_id: &str) -> bool {
        self.products.iter().any(|line| line.product == product_id)
    }

    pub fn quantity_of(&self, product_id: &str) -> u32 {
        self.products
            .iter()
            .find(|line| line.product == product_id)
            .map(|line| line.quantity)
            .unwrap_or(0)
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}
