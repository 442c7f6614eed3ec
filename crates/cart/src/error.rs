//! Cart operation errors.

use thiserror::Error;

use rocketshoes_core::ProductId;

use crate::api::ApiError;
use crate::storage::StorageError;

/// Why a cart operation failed.
///
/// Expected business outcomes (out of stock, non-positive quantity) are not
/// errors; see [`crate::Rejection`].
#[derive(Debug, Error)]
pub enum CartError {
    /// The product is not in the cart.
    #[error("Product {0} is not in the cart")]
    NotInCart(ProductId),

    /// The catalog answered with a different product than was asked for.
    #[error("Catalog returned product {returned} for product {requested}")]
    CatalogMismatch {
        requested: ProductId,
        returned: ProductId,
    },

    /// Stock or catalog lookup failed.
    #[error("Lookup failed: {0}")]
    Lookup(#[from] ApiError),

    /// Reading or writing the persisted cart failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The cart could not be serialized.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
