// Repositories module - data access layer

pub mod cart_repository;
pub mod product_repository;
pub mod table_manager;


pub use cart_repository::{CartRepository, DynamoDbCartRepository};
pub use product_repository::{DynamoDbProductRepository, ProductRepository};
pub use table_manager::TableManager;

use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::models::{RepositoryError, RepositoryResult};

/// Client span wrapping a single DynamoDB call
pub(crate) fn dynamodb_span(operation: &str, table_name: &str, region: &str) -> tracing::Span {
    tracing::info_span!(
        "DynamoDB",
        "aws.service" = "DynamoDB",
        "aws.operation" = operation,
        "aws.region" = %region,
        "aws.dynamodb.table_name" = %table_name,
        "otel.kind" = "client",
        "otel.name" = format!("DynamoDB.{}", operation),
        "rpc.system" = "aws-api",
        "rpc.service" = "AmazonDynamoDBv2",
        "rpc.method" = operation,
        "db.system" = "dynamodb",
        "db.name" = %table_name,
        "db.operation" = operation,
        "component" = "aws-sdk-dynamodb",
    )
}

pub(crate) fn required_string(
    item: &HashMap<String, AttributeValue>,
    field: &str,
) -> RepositoryResult<String> {
    item.get(field)
        .and_then(|v| v.as_s().ok())
        .cloned()
        .ok_or_else(|| RepositoryError::InvalidItem {
            message: format!("Missing {}", field),
        })
}

pub(crate) fn optional_timestamp(
    item: &HashMap<String, AttributeValue>,
    field: &str,
) -> Option<DateTime<Utc>> {
    item.get(field)
        .and_then(|v| v.as_s().ok())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

pub(crate) fn required_timestamp(
    item: &HashMap<String, AttributeValue>,
    field: &str,
) -> RepositoryResult<DateTime<Utc>> {
    optional_timestamp(item, field).ok_or_else(|| RepositoryError::InvalidItem {
        message: format!("Invalid {}", field),
    })
}
