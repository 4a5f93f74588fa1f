use std::sync::Arc;
use tracing::{instrument, warn};

use super::{ensure_identifier, ListenerRegistry};
use crate::models::{
    CreateProductRequest, Product, ProductPage, ProductQuery, RepositoryError, ServerEvent,
    ServiceError, ServiceResult, UpdateProductRequest, Validate,
};
use crate::repositories::ProductRepository;

/// Service for catalog products
pub struct ProductService {
    repository: Arc<dyn ProductRepository>,
    listeners: Option<Arc<ListenerRegistry>>,
}

impl ProductService {
    pub fn new(repository: Arc<dyn ProductRepository>) -> Self {
        Self {
            repository,
            listeners: None,
        }
    }

    /// Service that pushes a fresh product snapshot to live listeners after
    /// every create, update and delete
    pub fn new_with_listeners(
        repository: Arc<dyn ProductRepository>,
        listeners: Arc<ListenerRegistry>,
    ) -> Self {
        Self {
            repository,
            listeners: Some(listeners),
        }
    }

    /// Filtered, sorted and paginated listing
    #[instrument(skip(self, query), fields(limit = query.limit, page = query.page, sort = %query.raw_sort, search = %query.query))]
    pub async fn list_products(&self, query: &ProductQuery) -> ServiceResult<ProductPage> {
        let products = self.repository.find_all().await?;
        let page = query.apply(products);

        crate::info_with_trace!(
            "Listed page {} of {} ({} matching products)",
            page.page,
            page.total_pages,
            page.total_count
        );
        Ok(page)
    }

    /// Whole collection in store order
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> ServiceResult<Vec<Product>> {
        Ok(self.repository.find_all().await?)
    }

    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &str) -> ServiceResult<Product> {
        ensure_identifier("product_id", id)?;

        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::ProductNotFound { id: id.to_string() })
    }

    #[instrument(skip(self, request), fields(name = %request.name, category = %request.category))]
    pub async fn create_product(&self, request: CreateProductRequest) -> ServiceResult<Product> {
        request.validate()?;

        let product = self.repository.create(Product::new(request)).await?;
        crate::info_with_trace!(product_id = %product.id, "Product created");

        self.broadcast_products().await;
        Ok(product)
    }

    #[instrument(skip(self, request), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        id: &str,
        request: UpdateProductRequest,
    ) -> ServiceResult<Product> {
        ensure_identifier("product_id", id)?;
        request.validate()?;

        let mut product = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::ProductNotFound { id: id.to_string() })?;

        product.apply_update(request);

        let product = match self.repository.update(product).await {
            Ok(product) => product,
            // Deleted between the read and the write
            Err(RepositoryError::NotFound) => {
                return Err(ServiceError::ProductNotFound { id: id.to_string() })
            }
            Err(e) => return Err(e.into()),
        };
        crate::info_with_trace!("Product updated");

        self.broadcast_products().await;
        Ok(product)
    }

    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: &str) -> ServiceResult<()> {
        ensure_identifier("product_id", id)?;

        if !self.repository.delete(id).await? {
            return Err(ServiceError::ProductNotFound { id: id.to_string() });
        }
        crate::info_with_trace!("Product deleted");

        self.broadcast_products().await;
        Ok(())
    }

    /// Re-read the collection and push it to every listener. Failures are
    /// logged and never surface to the caller.
    pub async fn broadcast_products(&self) {
        let Some(listeners) = &self.listeners else {
            return;
        };

        match self.repository.find_all().await {
            Ok(products) => {
                listeners.broadcast(ServerEvent::UpdateProducts(products));
            }
            Err(e) => {
                warn!(error = %e, "Failed to load products for broadcast");
            }
        }
    }
}
