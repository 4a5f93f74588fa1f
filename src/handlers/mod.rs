pub mod carts;
pub mod error;
pub mod health;
pub mod metrics;
pub mod middleware;
pub mod products;
pub mod socket;
pub mod views;

pub use error::{error_body, service_error_to_response, ApiError};
pub use health::*;
pub use metrics::*;
pub use middleware::*;
pub use socket::ws_handler;
pub use views::PageTemplates;
