//! Product metadata, stock records and cart line items.
//!
//! These mirror the JSON shapes served by the store API and the shape the
//! cart is persisted in: a line item is the product's fields with an
//! `amount` alongside them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// Product display metadata from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    /// Unit price as served by the catalog. Carried for display only.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Image URL.
    pub image: String,
}

/// Available quantity for a product.
///
/// The stock service may omit `id`. `amount` is signed because the service
/// can report zero or negative stock, which simply means nothing is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ProductId>,
    pub amount: i64,
}

/// One product entry in the cart with its chosen quantity.
///
/// Serializes flat: `{"id":1,"title":"...","price":139.9,"image":"...","amount":2}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(flatten)]
    pub product: Product,
    pub amount: u32,
}

impl LineItem {
    /// Create a line item for a product.
    #[must_use]
    pub const fn new(product: Product, amount: u32) -> Self {
        Self { product, amount }
    }

    /// The product this line refers to.
    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.product.id
    }

    /// Copy of this line with a different amount.
    #[must_use]
    pub fn with_amount(&self, amount: u32) -> Self {
        Self {
            product: self.product.clone(),
            amount,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sneaker() -> Product {
        Product {
            id: ProductId::new(1),
            title: "Tênis de Caminhada Leve Confortável".to_string(),
            price: Decimal::new(1799, 1),
            image: "https://cdn.example.com/sneaker-1.jpg".to_string(),
        }
    }

    #[test]
    fn test_line_item_serializes_flat() {
        let item = LineItem::new(sneaker(), 2);
        let value = serde_json::to_value(&item).unwrap();

        assert_eq!(value["id"], 1);
        assert_eq!(value["amount"], 2);
        assert_eq!(value["price"], 179.9);
        assert!(value.get("product").is_none());
    }

    #[test]
    fn test_product_parses_numeric_price() {
        let json = r#"{"id":2,"title":"Tênis VR Caminhada","price":139.9,"image":"x.jpg"}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id, ProductId::new(2));
        assert_eq!(product.price, Decimal::new(1399, 1));
    }

    #[test]
    fn test_stock_record_amount_only() {
        let stock: StockRecord = serde_json::from_str(r#"{"amount":5}"#).unwrap();
        assert_eq!(stock.id, None);
        assert_eq!(stock.amount, 5);
    }

    #[test]
    fn test_stock_record_accepts_negative_amount() {
        let stock: StockRecord = serde_json::from_str(r#"{"id":1,"amount":-1}"#).unwrap();
        assert_eq!(stock.id, Some(ProductId::new(1)));
        assert_eq!(stock.amount, -1);
    }

    #[test]
    fn test_with_amount_keeps_product() {
        let item = LineItem::new(sneaker(), 1);
        let updated = item.with_amount(4);
        assert_eq!(updated.amount, 4);
        assert_eq!(updated.product, item.product);
        assert_eq!(item.amount, 1);
    }
}
