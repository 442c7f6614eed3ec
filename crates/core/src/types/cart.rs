//! Ordered cart contents.
//!
//! `CartState` is an immutable snapshot: every transformation returns a new
//! sequence and leaves `self` untouched, so a snapshot handed to a reader can
//! never change underneath it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::product::LineItem;

/// The full ordered collection of line items.
///
/// Insertion order is display order. Holds at most one line per product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartState {
    items: Vec<LineItem>,
}

impl CartState {
    /// Create an empty cart.
    #[must_use]
    pub const fn empty() -> Self {
        Self { items: Vec::new() }
    }

    /// Create a cart from already-ordered items.
    ///
    /// Does not check invariants; see [`Self::is_consistent`].
    #[must_use]
    pub const fn from_items(items: Vec<LineItem>) -> Self {
        Self { items }
    }

    pub fn iter(&self) -> impl Iterator<Item = &LineItem> {
        self.items.iter()
    }

    /// Number of distinct products in the cart.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Find the line for a product.
    #[must_use]
    pub fn get(&self, product_id: ProductId) -> Option<&LineItem> {
        self.items
            .iter()
            .find(|item| item.product_id() == product_id)
    }

    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.get(product_id).is_some()
    }

    /// Sum of all line amounts (the header badge count).
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.amount)).sum()
    }

    /// New cart with the matching line's amount replaced.
    ///
    /// Every other line is carried over unchanged. If no line matches, the
    /// result equals `self`.
    #[must_use]
    pub fn with_amount(&self, product_id: ProductId, amount: u32) -> Self {
        let items = self
            .items
            .iter()
            .map(|item| {
                if item.product_id() == product_id {
                    item.with_amount(amount)
                } else {
                    item.clone()
                }
            })
            .collect();

        Self { items }
    }

    /// New cart with `item` appended at the end.
    #[must_use]
    pub fn with_item(&self, item: LineItem) -> Self {
        let mut items = Vec::with_capacity(self.items.len() + 1);
        items.extend(self.items.iter().cloned());
        items.push(item);
        Self { items }
    }

    /// New cart without the line for `product_id`.
    ///
    /// Returns `None` when the product is not in the cart.
    #[must_use]
    pub fn without(&self, product_id: ProductId) -> Option<Self> {
        if !self.contains(product_id) {
            return None;
        }

        let items = self
            .items
            .iter()
            .filter(|item| item.product_id() != product_id)
            .cloned()
            .collect();

        Some(Self { items })
    }

    /// Whether product ids are unique and every amount is at least 1.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let mut seen = HashSet::with_capacity(self.items.len());
        self.items
            .iter()
            .all(|item| item.amount >= 1 && seen.insert(item.product_id()))
    }
}

impl<'a> IntoIterator for &'a CartState {
    type Item = &'a LineItem;
    type IntoIter = std::slice::Iter<'a, LineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::types::product::Product;

    fn item(id: i32, amount: u32) -> LineItem {
        LineItem::new(
            Product {
                id: ProductId::new(id),
                title: format!("Tênis {id}"),
                price: Decimal::new(i64::from(id) * 1000 + 990, 2),
                image: format!("https://cdn.example.com/{id}.jpg"),
            },
            amount,
        )
    }

    fn ids(cart: &CartState) -> Vec<i32> {
        cart.iter().map(|i| i.product_id().as_i32()).collect()
    }

    #[test]
    fn test_with_amount_preserves_order_and_other_lines() {
        let cart = CartState::from_items(vec![item(1, 1), item(2, 3), item(3, 1)]);
        let updated = cart.with_amount(ProductId::new(2), 5);

        assert_eq!(ids(&updated), vec![1, 2, 3]);
        assert_eq!(updated.get(ProductId::new(2)).unwrap().amount, 5);
        assert_eq!(updated.get(ProductId::new(1)), cart.get(ProductId::new(1)));
        assert_eq!(updated.get(ProductId::new(3)), cart.get(ProductId::new(3)));
        // Source snapshot untouched
        assert_eq!(cart.get(ProductId::new(2)).unwrap().amount, 3);
    }

    #[test]
    fn test_with_amount_unknown_product_is_identity() {
        let cart = CartState::from_items(vec![item(1, 1)]);
        assert_eq!(cart.with_amount(ProductId::new(9), 2), cart);
    }

    #[test]
    fn test_with_item_appends() {
        let cart = CartState::from_items(vec![item(2, 1)]);
        let updated = cart.with_item(item(1, 1));

        assert_eq!(ids(&updated), vec![2, 1]);
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_without_removes_only_target() {
        let cart = CartState::from_items(vec![item(1, 2), item(2, 1), item(3, 4)]);
        let updated = cart.without(ProductId::new(2)).unwrap();

        assert_eq!(ids(&updated), vec![1, 3]);
        assert_eq!(updated.get(ProductId::new(3)).unwrap().amount, 4);
    }

    #[test]
    fn test_without_missing_product() {
        let cart = CartState::from_items(vec![item(1, 2)]);
        assert!(cart.without(ProductId::new(2)).is_none());
    }

    #[test]
    fn test_total_quantity() {
        let cart = CartState::from_items(vec![item(1, 2), item(2, 3)]);
        assert_eq!(cart.total_quantity(), 5);
        assert_eq!(CartState::empty().total_quantity(), 0);
    }

    #[test]
    fn test_is_consistent() {
        assert!(CartState::empty().is_consistent());
        assert!(CartState::from_items(vec![item(1, 1), item(2, 2)]).is_consistent());
        assert!(!CartState::from_items(vec![item(1, 1), item(1, 2)]).is_consistent());
        assert!(!CartState::from_items(vec![item(1, 0)]).is_consistent());
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let cart = CartState::from_items(vec![item(1, 2)]);
        let value = serde_json::to_value(&cart).unwrap();

        assert!(value.is_array());
        assert_eq!(value[0]["id"], 1);
        assert_eq!(value[0]["amount"], 2);
    }

    #[test]
    fn test_json_round_trip_preserves_order() {
        let cart = CartState::from_items(vec![item(3, 1), item(1, 2), item(2, 5)]);
        let json = serde_json::to_string(&cart).unwrap();
        let restored: CartState = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, cart);
    }
}
