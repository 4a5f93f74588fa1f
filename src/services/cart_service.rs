use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{info, instrument};

use super::ensure_identifier;
use crate::models::{
    validate_cart_quantity, Cart, CartLineItemView, CartView, ServiceError, ServiceResult,
};
use crate::repositories::{CartRepository, ProductRepository};

/// Service for managing shopping carts
pub struct CartService {
    cart_repository: Arc<dyn CartRepository>,
    product_repository: Arc<dyn ProductRepository>,
}

impl CartService {
    pub fn new(
        cart_repository: Arc<dyn CartRepository>,
        product_repository: Arc<dyn ProductRepository>,
    ) -> Self {
        Self {
            cart_repository,
            product_repository,
        }
    }

    /// Persist a new empty cart
    #[instrument(skip(self))]
    pub async fn create_cart(&self) -> ServiceResult<Cart> {
        let cart = self.cart_repository.save_cart(Cart::new()).await?;
        crate::info_with_trace!(cart_id = %cart.id, "Cart created");
        Ok(cart)
    }

    /// Cart with each referenced product resolved
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn get_cart(&self, cart_id: &str) -> ServiceResult<CartView> {
        let cart = self.load_cart(cart_id).await?;

        let lookups = cart.products.iter().map(|line| async move {
            let product = self.product_repository.find_by_id(&line.product).await?;
            Ok::<_, ServiceError>(CartLineItemView {
                product_id: line.product.clone(),
                product,
                quantity: line.quantity,
            })
        });
        let products = try_join_all(lookups).await?;

        let dangling = products.iter().filter(|line| line.product.is_none()).count();
        if dangling > 0 {
            info!(dangling, "Cart references products that no longer exist");
        }

        Ok(CartView {
            total_items: cart.total_items(),
            id: cart.id,
            products,
            created_at: cart.created_at,
            updated_at: cart.updated_at,
        })
    }

    /// Add one unit of a product, merging with an existing line item
    #[instrument(skip(self), fields(cart_id = %cart_id, product_id = %product_id))]
    pub async fn add_product(&self, cart_id: &str, product_id: &str) -> ServiceResult<Cart> {
        ensure_identifier("product_id", product_id)?;

        let mut cart = self.load_cart(cart_id).await?;

        if self.product_repository.find_by_id(product_id).await?.is_none() {
            return Err(ServiceError::ProductNotFound {
                id: product_id.to_string(),
            });
        }

        let quantity = cart.add_product(product_id)?;
        let cart = self.cart_repository.save_cart(cart).await?;

        crate::info_with_trace!(quantity, "Product added to cart");
        Ok(cart)
    }

    /// Drop a product's line item. Removing something not in the cart
    /// succeeds and leaves the cart as it was.
    #[instrument(skip(self), fields(cart_id = %cart_id, product_id = %product_id))]
    pub async fn remove_product(&self, cart_id: &str, product_id: &str) -> ServiceResult<Cart> {
        ensure_identifier("product_id", product_id)?;

        let mut cart = self.load_cart(cart_id).await?;

        if !cart.remove_product(product_id) {
            info!("Product not in cart, nothing to remove");
            return Ok(cart);
        }

        let cart = self.cart_repository.save_cart(cart).await?;
        crate::info_with_trace!("Product removed from cart");
        Ok(cart)
    }

    /// Overwrite the quantity of a product already in the cart
    #[instrument(skip(self), fields(cart_id = %cart_id, product_id = %product_id, quantity = quantity))]
    pub async fn set_quantity(
        &self,
        cart_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> ServiceResult<Cart> {
        ensure_identifier("product_id", product_id)?;
        let quantity = validate_cart_quantity(quantity)?;

        let mut cart = self.load_cart(cart_id).await?;

        if !cart.set_quantity(product_id, quantity) {
            return Err(ServiceError::ItemNotInCart {
                cart_id: cart_id.to_string(),
                product_id: product_id.to_string(),
            });
        }

        let cart = self.cart_repository.save_cart(cart).await?;
        crate::info_with_trace!("Cart quantity updated");
        Ok(cart)
    }

    /// Empty the cart, keeping the cart itself
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn clear_cart(&self, cart_id: &str) -> ServiceResult<Cart> {
        let mut cart = self.load_cart(cart_id).await?;
        let removed = cart.products.len();

        cart.clear();
        let cart = self.cart_repository.save_cart(cart).await?;

        crate::info_with_trace!(removed, "Cart cleared");
        Ok(cart)
    }

    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn delete_cart(&self, cart_id: &str) -> ServiceResult<()> {
        ensure_identifier("cart_id", cart_id)?;

        if !self.cart_repository.delete_cart(cart_id).await? {
            return Err(ServiceError::CartNotFound {
                id: cart_id.to_string(),
            });
        }

        crate::info_with_trace!("Cart deleted");
        Ok(())
    }

    async fn load_cart(&self, cart_id: &str) -> ServiceResult<Cart> {
        ensure_identifier("cart_id", cart_id)?;

        self.cart_repository
            .find_cart(cart_id)
            .await?
            .ok_or_else(|| ServiceError::CartNotFound {
                id: cart_id.to_string(),
            })
    }
}
