use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::{Client as DynamoDbClient, Error as DynamoDbError};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn, Instrument};

use super::{dynamodb_span, optional_timestamp, required_string, required_timestamp};
use crate::models::{Cart, CartLineItem, RepositoryError, RepositoryResult};

/// Trait defining the interface for cart data access operations
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Find a cart by ID
    async fn find_cart(&self, id: &str) -> RepositoryResult<Option<Cart>>;

    /// Save a cart (create or replace the whole record)
    async fn save_cart(&self, cart: Cart) -> RepositoryResult<Cart>;

    /// Delete a cart, returning whether it existed
    async fn delete_cart(&self, id: &str) -> RepositoryResult<bool>;
}

/// DynamoDB implementation of the CartRepository trait
pub struct DynamoDbCartRepository {
    client: Arc<DynamoDbClient>,
    table_name: String,
    region: String,
}

impl DynamoDbCartRepository {
    /// Create a new DynamoDB cart repository
    pub fn new(client: Arc<DynamoDbClient>, table_name: String, region: String) -> Self {
        Self {
            client,
            table_name,
            region,
        }
    }

    /// Get the table name (for testing)
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    fn span(&self, operation: &str) -> tracing::Span {
        dynamodb_span(operation, &self.table_name, &self.region)
    }

    /// Convert a Cart struct to DynamoDB attribute values
    pub fn cart_to_item(&self, cart: &Cart) -> HashMap<String, AttributeValue> {
        let mut item = HashMap::new();

        item.insert("id".to_string(), AttributeValue::S(cart.id.clone()));

        let products: Vec<AttributeValue> = cart
            .products
            .iter()
            .map(|line| {
                let mut line_map = HashMap::new();
                line_map.insert(
                    "product".to_string(),
                    AttributeValue::S(line.product.clone()),
                );
                line_map.insert(
                    "quantity".to_string(),
                    AttributeValue::N(line.quantity.to_string()),
                );
                AttributeValue::M(line_map)
            })
            .collect();

        item.insert("products".to_string(), AttributeValue::L(products));
        item.insert(
            "created_at".to_string(),
            AttributeValue::S(cart.created_at.to_rfc3339()),
        );
        item.insert(
            "updated_at".to_string(),
            AttributeValue::S(cart.updated_at.to_rfc3339()),
        );

        item
    }

    /// Convert DynamoDB item to Cart struct
    pub fn item_to_cart(&self, item: HashMap<String, AttributeValue>) -> RepositoryResult<Cart> {
        let id = required_string(&item, "id")?;

        let products = match item.get("products").and_then(|v| v.as_l().ok()) {
            Some(list) => list
                .iter()
                .map(|value| {
                    value
                        .as_m()
                        .map_err(|_| RepositoryError::InvalidItem {
                            message: "Cart line item is not a map".to_string(),
                        })
                        .and_then(|line_map| self.map_to_line_item(line_map))
                })
                .collect::<RepositoryResult<Vec<_>>>()?,
            None => Vec::new(),
        };

        let created_at = required_timestamp(&item, "created_at")?;
        let updated_at = optional_timestamp(&item, "updated_at").unwrap_or(created_at);

        Ok(Cart {
            id,
            products,
            created_at,
            updated_at,
        })
    }

    /// Convert DynamoDB map to CartLineItem
    pub fn map_to_line_item(
        &self,
        line_map: &HashMap<String, AttributeValue>,
    ) -> RepositoryResult<CartLineItem> {
        let product = line_map
            .get("product")
            .and_then(|v| v.as_s().ok())
            .cloned()
            .ok_or_else(|| RepositoryError::InvalidItem {
                message: "Missing product in cart line item".to_string(),
            })?;

        let quantity = line_map
            .get("quantity")
            .and_then(|v| v.as_n().ok())
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| RepositoryError::InvalidItem {
                message: "Invalid quantity in cart line item".to_string(),
            })?;

        Ok(CartLineItem { product, quantity })
    }

    /// Convert DynamoDB error to RepositoryError
    fn map_dynamodb_error(&self, error: DynamoDbError) -> RepositoryError {
        error!("DynamoDB error: {:?}", error);
        match error {
            DynamoDbError::ResourceNotFoundException(_) => RepositoryError::TableNotFound {
                table_name: self.table_name.clone(),
            },
            other => RepositoryError::AwsSdk {
                message: other.to_string(),
            },
        }
    }
}

#[async_trait]
impl CartRepository for DynamoDbCartRepository {
    #[instrument(skip(self), fields(table = %self.table_name, cart_id = %id))]
    async fn find_cart(&self, id: &str) -> RepositoryResult<Option<Cart>> {
        info!("Finding cart");

        let response = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(id.to_string()))
            .send()
            .instrument(self.span("GetItem"))
            .await
            .map_err(|e| self.map_dynamodb_error(e.into()))?;

        match response.item {
            Some(item) => {
                let cart = self.item_to_cart(item)?;
                info!("Cart found with {} line items", cart.products.len());
                Ok(Some(cart))
            }
            None => {
                info!("Cart not found");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, cart), fields(table = %self.table_name, cart_id = %cart.id, line_items = cart.products.len()))]
    async fn save_cart(&self, cart: Cart) -> RepositoryResult<Cart> {
        info!("Saving cart");

        let item = self.cart_to_item(&cart);

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .instrument(self.span("PutItem"))
            .await
            .map_err(|e| self.map_dynamodb_error(e.into()))?;

        info!("Cart saved successfully");
        Ok(cart)
    }

    #[instrument(skip(self), fields(table = %self.table_name, cart_id = %id))]
    async fn delete_cart(&self, id: &str) -> RepositoryResult<bool> {
        info!("Deleting cart");

        let response = self
            .client
            .delete_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(id.to_string()))
            .return_values(ReturnValue::AllOld)
            .send()
            .instrument(self.span("DeleteItem"))
            .await
            .map_err(|e| self.map_dynamodb_error(e.into()))?;

        let existed = response.attributes.is_some_and(|old| !old.is_empty());
        if !existed {
            warn!("Delete requested for a cart that does not exist");
        }
        Ok(existed)
    }
}
