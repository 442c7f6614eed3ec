//! Remote lookups the cart store depends on.
//!
//! Both are read-only. [`ApiClient`] implements them over HTTP; tests and
//! embedders can substitute their own implementations.

use async_trait::async_trait;

use rocketshoes_core::{Product, ProductId, StockRecord};

use crate::api::{ApiClient, ApiError};

/// Source of truth for how many units of a product are available.
#[async_trait]
pub trait StockService: Send + Sync {
    /// Current stock record for a product.
    async fn stock(&self, product_id: ProductId) -> Result<StockRecord, ApiError>;
}

/// Source of product display metadata.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Metadata for a product.
    async fn product(&self, product_id: ProductId) -> Result<Product, ApiError>;
}

#[async_trait]
impl StockService for ApiClient {
    async fn stock(&self, product_id: ProductId) -> Result<StockRecord, ApiError> {
        self.get_stock(product_id).await
    }
}

#[async_trait]
impl ProductCatalog for ApiClient {
    async fn product(&self, product_id: ProductId) -> Result<Product, ApiError> {
        self.get_product(product_id).await
    }
}
