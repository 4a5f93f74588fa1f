use rust_decimal::Decimal;
use uuid::Uuid;

use super::{
    CreateProductRequest, UpdateProductRequest, UpdateQuantityRequest, ValidationError,
    ValidationResult,
};

/// Trait for validating input models
pub trait Validate {
    fn validate(&self) -> ValidationResult<()>;
}

/// Validation constants
pub const MAX_PRODUCT_NAME_LENGTH: usize = 200;
pub const MAX_CATEGORY_LENGTH: usize = 100;
pub const MAX_DESCRIPTION_LENGTH: usize = 2000;
pub const MIN_PRICE: Decimal = Decimal::ZERO;
pub const MAX_PRICE: Decimal = Decimal::from_parts(99999999, 0, 0, false, 2); // 999999.99
pub const MAX_STOCK: u32 = 999999;
pub const MAX_CART_QUANTITY: u32 = 1000;
pub const MIN_CART_QUANTITY: u32 = 1;

impl Validate for CreateProductRequest {
    fn validate(&self) -> ValidationResult<()> {
        validate_text_field("name", &self.name, MAX_PRODUCT_NAME_LENGTH)?;
        validate_text_field("category", &self.category, MAX_CATEGORY_LENGTH)?;
        validate_description(&self.description)?;
        validate_price(&self.price)?;
        validate_stock(self.stock)?;
        Ok(())
    }
}

impl Validate for UpdateProductRequest {
    fn validate(&self) -> ValidationResult<()> {
        if let Some(name) = &self.name {
            validate_text_field("name", name, MAX_PRODUCT_NAME_LENGTH)?;
        }
        if let Some(category) = &self.category {
            validate_text_field("category", category, MAX_CATEGORY_LENGTH)?;
        }
        if let Some(description) = &self.description {
            validate_description(description)?;
        }
        if let Some(price) = &self.price {
            validate_price(price)?;
        }
        if let Some(stock) = self.stock {
            validate_stock(stock)?;
        }
        Ok(())
    }
}

impl Validate for UpdateQuantityRequest {
    fn validate(&self) -> ValidationResult<()> {
        validate_cart_quantity(self.quantity).map(|_| ())
    }
}

/// Validate a required, bounded single-line text field
pub fn validate_text_field(field: &str, value: &str, max_length: usize) -> ValidationResult<()> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::RequiredField {
            field: field.to_string(),
        });
    }

    if trimmed.chars().count() > max_length {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max_length,
            actual_length: trimmed.chars().count(),
        });
    }

    if trimmed
        .chars()
        .any(|c| c.is_control() && c != '\n' && c != '\r' && c != '\t')
    {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: "Contains invalid control characters".to_string(),
        });
    }

    Ok(())
}

pub fn validate_description(description: &Option<String>) -> ValidationResult<()> {
    if let Some(description) = description {
        let length = description.trim().chars().count();
        if length > MAX_DESCRIPTION_LENGTH {
            return Err(ValidationError::TooLong {
                field: "description".to_string(),
                max_length: MAX_DESCRIPTION_LENGTH,
                actual_length: length,
            });
        }
    }

    Ok(())
}

pub fn validate_price(price: &Decimal) -> ValidationResult<()> {
    if *price < MIN_PRICE || *price > MAX_PRICE {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: MIN_PRICE.to_string(),
            max: MAX_PRICE.to_string(),
            value: price.to_string(),
        });
    }

    Ok(())
}

pub fn validate_stock(stock: u32) -> ValidationResult<()> {
    if stock > MAX_STOCK {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: "0".to_string(),
            max: MAX_STOCK.to_string(),
            value: stock.to_string(),
        });
    }

    Ok(())
}

/// Validate a requested line item quantity and narrow it to `u32`
pub fn validate_cart_quantity(quantity: i64) -> ValidationResult<u32> {
    if quantity < i64::from(MIN_CART_QUANTITY) || quantity > i64::from(MAX_CART_QUANTITY) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: MIN_CART_QUANTITY.to_string(),
            max: MAX_CART_QUANTITY.to_string(),
            value: quantity.to_string(),
        });
    }

    u32::try_from(quantity).map_err(|_| ValidationError::InvalidValue {
        field: "quantity".to_string(),
        value: quantity.to_string(),
        reason: "Quantity does not fit in an unsigned integer".to_string(),
    })
}

/// Validate a store-assigned identifier (UUID)
pub fn validate_identifier(field: &str, id: &str) -> ValidationResult<()> {
    Uuid::parse_str(id.trim())
        .map(|_| ())
        .map_err(|_| ValidationError::InvalidFormat {
            field: field.to_string(),
            expected: "UUID".to_string(),
        })
}
