pub mod cart_service;
pub mod notifier;
pub mod product_service;

pub use cart_service::CartService;
pub use notifier::{ListenerId, ListenerRegistry, ListenerSender};
pub use product_service::ProductService;

use crate::models::{validate_identifier, ServiceError, ServiceResult};

/// Reject identifiers the store could never have assigned
pub(crate) fn ensure_identifier(field: &str, id: &str) -> ServiceResult<()> {
    validate_identifier(field, id).map_err(|_| ServiceError::InvalidIdentifier {
        id: id.to_string(),
    })
}
