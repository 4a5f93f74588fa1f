use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::{Client as DynamoDbClient, Error as DynamoDbError};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, instrument, warn, Instrument};

use super::{dynamodb_span, optional_timestamp, required_string, required_timestamp};
use crate::models::{AvailabilityStatus, Product, RepositoryError, RepositoryResult};

/// Trait defining the interface for product data access operations
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Every product, in store order (oldest first)
    async fn find_all(&self) -> RepositoryResult<Vec<Product>>;

    /// Find a product by its identifier
    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Product>>;

    /// Insert a new product
    async fn create(&self, product: Product) -> RepositoryResult<Product>;

    /// Replace an existing product; `RepositoryError::NotFound` when absent
    async fn update(&self, product: Product) -> RepositoryResult<Product>;

    /// Delete a product, returning whether it existed
    async fn delete(&self, id: &str) -> RepositoryResult<bool>;
}

/// DynamoDB implementation of the ProductRepository trait
pub struct DynamoDbProductRepository {
    client: Arc<DynamoDbClient>,
    table_name: String,
    region: String,
}

impl DynamoDbProductRepository {
    pub fn new(client: Arc<DynamoDbClient>, table_name: String, region: String) -> Self {
        Self {
            client,
            table_name,
            region,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    fn span(&self, operation: &str) -> tracing::Span {
        dynamodb_span(operation, &self.table_name, &self.region)
    }

    /// Convert a Product to DynamoDB attribute values
    pub fn product_to_item(
        &self,
        product: &Product,
    ) -> RepositoryResult<HashMap<String, AttributeValue>> {
        let mut item = HashMap::new();

        item.insert("id".to_string(), AttributeValue::S(product.id.clone()));
        item.insert("name".to_string(), AttributeValue::S(product.name.clone()));
        if let Some(ref description) = product.description {
            item.insert(
                "description".to_string(),
                AttributeValue::S(description.clone()),
            );
        }
        item.insert(
            "category".to_string(),
            AttributeValue::S(product.category.clone()),
        );
        item.insert(
            "availability".to_string(),
            AttributeValue::S(product.availability.to_string()),
        );
        item.insert(
            "price".to_string(),
            AttributeValue::N(product.price.to_string()),
        );
        item.insert(
            "stock".to_string(),
            AttributeValue::N(product.stock.to_string()),
        );
        // Opaque payload is kept as a JSON document
        item.insert(
            "attributes".to_string(),
            AttributeValue::S(serde_json::to_string(&product.attributes)?),
        );
        item.insert(
            "created_at".to_string(),
            AttributeValue::S(product.created_at.to_rfc3339()),
        );
        item.insert(
            "updated_at".to_string(),
            AttributeValue::S(product.updated_at.to_rfc3339()),
        );

        Ok(item)
    }

    /// Convert a DynamoDB item to a Product
    pub fn item_to_product(
        &self,
        item: HashMap<String, AttributeValue>,
    ) -> RepositoryResult<Product> {
        let id = required_string(&item, "id")?;
        let name = required_string(&item, "name")?;
        let category = required_string(&item, "category")?;

        let description = item
            .get("description")
            .and_then(|v| v.as_s().ok())
            .cloned();

        let availability = item
            .get("availability")
            .and_then(|v| v.as_s().ok())
            .map(|s| AvailabilityStatus::from_str(s))
            .transpose()
            .map_err(|message| RepositoryError::InvalidItem { message })?
            .unwrap_or_default();

        let price = item
            .get("price")
            .and_then(|v| v.as_n().ok())
            .and_then(|s| Decimal::from_str(s).ok())
            .ok_or_else(|| RepositoryError::InvalidItem {
                message: "Invalid price".to_string(),
            })?;

        let stock = item
            .get("stock")
            .and_then(|v| v.as_n().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);

        let attributes = match item.get("attributes").and_then(|v| v.as_s().ok()) {
            Some(raw) => serde_json::from_str::<Map<String, Value>>(raw)?,
            None => Map::new(),
        };

        let created_at = required_timestamp(&item, "created_at")?;
        let updated_at = optional_timestamp(&item, "updated_at").unwrap_or(created_at);

        Ok(Product {
            id,
            name,
            description,
            category,
            availability,
            price,
            stock,
            attributes,
            created_at,
            updated_at,
        })
    }

    fn map_dynamodb_error(&self, error: DynamoDbError) -> RepositoryError {
        match error {
            DynamoDbError::ResourceNotFoundException(_) => {
                error!("DynamoDB table missing: {}", self.table_name);
                RepositoryError::TableNotFound {
                    table_name: self.table_name.clone(),
                }
            }
            DynamoDbError::ConditionalCheckFailedException(_) => {
                warn!("Conditional write rejected: item does not exist");
                RepositoryError::NotFound
            }
            other => {
                error!("DynamoDB error: {:?}", other);
                RepositoryError::AwsSdk {
                    message: other.to_string(),
                }
            }
        }
    }
}

#[async_trait]
impl ProductRepository for DynamoDbProductRepository {
    #[instrument(skip(self), fields(table = %self.table_name))]
    async fn find_all(&self) -> RepositoryResult<Vec<Product>> {
        info!("Scanning all products");

        let mut products = Vec::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let response = self
                .client
                .scan()
                .table_name(&self.table_name)
                .set_exclusive_start_key(start_key.take())
                .send()
                .instrument(self.span("Scan"))
                .await
                .map_err(|e| self.map_dynamodb_error(e.into()))?;

            for item in response.items.unwrap_or_default() {
                match self.item_to_product(item) {
                    Ok(product) => products.push(product),
                    Err(e) => warn!("Failed to parse product item: {}", e),
                }
            }

            match response.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        // Scan order is arbitrary; present insertion order instead
        products.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        info!("Found {} products", products.len());
        Ok(products)
    }

    #[instrument(skip(self), fields(table = %self.table_name, id = %id))]
    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Product>> {
        info!("Finding product by ID");

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
            Some(item) => Ok(Some(self.item_to_product(item)?)),
            None => {
                info!("Product not found");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, product), fields(table = %self.table_name, id = %product.id))]
    async fn create(&self, product: Product) -> RepositoryResult<Product> {
        info!("Creating product");

        let item = self.product_to_item(&product)?;

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .instrument(self.span("PutItem"))
            .await
            .map_err(|e| self.map_dynamodb_error(e.into()))?;

        info!("Product created successfully");
        Ok(product)
    }

    #[instrument(skip(self, product), fields(table = %self.table_name, id = %product.id))]
    async fn update(&self, product: Product) -> RepositoryResult<Product> {
        info!("Updating product");

        let item = self.product_to_item(&product)?;

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("attribute_exists(id)")
            .send()
            .instrument(self.span("PutItem"))
            .await
            .map_err(|e| self.map_dynamodb_error(e.into()))?;

        info!("Product updated successfully");
        Ok(product)
    }

    #[instrument(skip(self), fields(table = %self.table_name, id = %id))]
    async fn delete(&self, id: &str) -> RepositoryResult<bool> {
        info!("Deleting product");

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
        info!("Product deleted: {}", existed);
        Ok(existed)
    }
}
