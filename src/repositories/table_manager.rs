use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ScalarAttributeType, TableStatus,
};
use aws_sdk_dynamodb::{Client as DynamoDbClient, Error as DynamoDbError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use crate::models::{RepositoryError, RepositoryResult};

const MAX_ACTIVATION_POLLS: u32 = 30;
const ACTIVATION_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Creates the product and cart tables on startup when requested
pub struct TableManager {
    client: Arc<DynamoDbClient>,
}

impl TableManager {
    pub fn new(client: Arc<DynamoDbClient>) -> Self {
        Self { client }
    }

    /// Create a table keyed by a string `id`, unless it already exists
    #[instrument(skip(self), fields(table_name = %table_name))]
    pub async fn ensure_table(&self, table_name: &str) -> RepositoryResult<()> {
        if self.table_exists(table_name).await? {
            info!("Table {} already exists", table_name);
            return Ok(());
        }

        info!("Creating table {}", table_name);

        let attribute_definition = AttributeDefinition::builder()
            .attribute_name("id")
            .attribute_type(ScalarAttributeType::S)
            .build()
            .map_err(|e| RepositoryError::AwsSdk {
                message: format!("Failed to build attribute definition: {}", e),
            })?;

        let key_schema = KeySchemaElement::builder()
            .attribute_name("id")
            .key_type(KeyType::Hash)
            .build()
            .map_err(|e| RepositoryError::AwsSdk {
                message: format!("Failed to build key schema: {}", e),
            })?;

        self.client
            .create_table()
            .table_name(table_name)
            .attribute_definitions(attribute_definition)
            .key_schema(key_schema)
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await
            .map_err(|e| self.map_dynamodb_error(e.into()))?;

        self.wait_for_table_active(table_name).await?;
        info!("Table {} created successfully", table_name);
        Ok(())
    }

    /// Create both tables concurrently
    #[instrument(skip(self))]
    pub async fn ensure_all_tables(
        &self,
        products_table: &str,
        carts_table: &str,
    ) -> RepositoryResult<()> {
        let (products_result, carts_result) = tokio::join!(
            self.ensure_table(products_table),
            self.ensure_table(carts_table)
        );

        products_result?;
        carts_result?;
        Ok(())
    }

    #[instrument(skip(self), fields(table_name = %table_name))]
    pub async fn table_exists(&self, table_name: &str) -> RepositoryResult<bool> {
        match self.client.describe_table().table_name(table_name).send().await {
            Ok(_) => Ok(true),
            Err(e) => match DynamoDbError::from(e) {
                DynamoDbError::ResourceNotFoundException(_) => Ok(false),
                other => {
                    error!("Error checking table existence: {}", other);
                    Err(RepositoryError::ConnectionFailed)
                }
            },
        }
    }

    async fn wait_for_table_active(&self, table_name: &str) -> RepositoryResult<()> {
        for _ in 0..MAX_ACTIVATION_POLLS {
            let response = self
                .client
                .describe_table()
                .table_name(table_name)
                .send()
                .await
                .map_err(|e| self.map_dynamodb_error(e.into()))?;

            match response.table.and_then(|table| table.table_status) {
                Some(TableStatus::Active) => return Ok(()),
                Some(status) => info!("Table {} status: {:?}, waiting...", table_name, status),
                None => warn!("Table {} status unknown, waiting...", table_name),
            }

            tokio::time::sleep(ACTIVATION_POLL_INTERVAL).await;
        }

        error!("Timeout waiting for table {} to become active", table_name);
        Err(RepositoryError::Timeout)
    }

    fn map_dynamodb_error(&self, error: DynamoDbError) -> RepositoryError {
        error!("DynamoDB error: {:?}", error);
        RepositoryError::AwsSdk {
            message: error.to_string(),
        }
    }
}
