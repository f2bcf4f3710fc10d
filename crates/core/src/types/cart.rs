//! Cart lines and the ordered cart collection.
//!
//! These are plain values. Persistence and change notification live in the
//! storefront's `CartStore`; everything here is pure and synchronous.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::catalog::Catalog;
use super::id::VariantKey;
use super::price::format_amount;

/// One line in the cart, one per distinct variant.
///
/// Serialized field names match the persisted browser-storage layout:
/// `id`, `name`, `color`, `price` (a JSON number), `currency`, `quantity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Variant key; the line's identity.
    pub id: VariantKey,
    /// Catalog product name.
    pub name: String,
    /// Human-readable variant descriptor.
    #[serde(rename = "color")]
    pub variant_label: String,
    /// Price of a single unit.
    #[serde(rename = "price", with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    /// Display-only currency tag.
    #[serde(rename = "currency")]
    pub currency_symbol: String,
    /// Always positive while the line is in a cart.
    pub quantity: u32,
}

impl CartItem {
    /// `unit_price × quantity`, saturating at [`Decimal::MAX`].
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price.saturating_mul(Decimal::from(self.quantity))
    }

    /// Unit price formatted with the currency symbol.
    #[must_use]
    pub fn display_price(&self) -> String {
        format_amount(&self.currency_symbol, self.unit_price)
    }
}

/// Ordered collection of cart lines, unique by id.
///
/// New lines append; existing lines are updated in place, so insertion
/// order is stable across mutations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Parse the persisted JSON layout.
    ///
    /// Lines that would break the cart invariants are dropped: zero
    /// quantities, negative prices, and repeated ids after the first.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not a JSON array of cart lines.
    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        let items: Vec<CartItem> = serde_json::from_str(payload)?;
        Ok(Self::from_items(items))
    }

    /// Build a cart from raw lines, enforcing the invariants.
    #[must_use]
    pub fn from_items(items: Vec<CartItem>) -> Self {
        let mut seen = HashSet::new();
        let items = items
            .into_iter()
            .filter(|item| item.quantity > 0 && item.unit_price >= Decimal::ZERO)
            .filter(|item| seen.insert(item.id.clone()))
            .collect();
        Self { items }
    }

    /// Serialize to the persisted JSON layout.
    ///
    /// # Errors
    ///
    /// Returns an error if a price cannot be represented as a JSON number.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.items)
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Iterate over lines in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, CartItem> {
        self.items.iter()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up a line by variant key.
    #[must_use]
    pub fn get(&self, key: &VariantKey) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.id == key)
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.items
            .iter()
            .fold(0_u32, |sum, item| sum.saturating_add(item.quantity))
    }

    /// Sum of `unit_price × quantity` over all lines, saturating at
    /// [`Decimal::MAX`] for absurd stored prices.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items
            .iter()
            .map(CartItem::line_total)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Increment an existing line, or append a new line from the catalog.
    pub fn add(&mut self, key: &VariantKey, catalog: &Catalog) {
        if let Some(item) = self.items.iter_mut().find(|item| &item.id == key) {
            item.quantity = item.quantity.saturating_add(1);
        } else {
            self.items.push(catalog.new_line(key));
        }
    }

    /// Set a line's quantity; zero or below removes it.
    ///
    /// Never creates a line. Returns whether the cart changed.
    pub fn set_quantity(&mut self, key: &VariantKey, quantity: i64) -> bool {
        let quantity = u32::try_from(quantity.max(0)).unwrap_or(u32::MAX);
        if quantity == 0 {
            return self.remove(key);
        }
        match self.items.iter_mut().find(|item| &item.id == key) {
            Some(item) if item.quantity != quantity => {
                item.quantity = quantity;
                true
            }
            _ => false,
        }
    }

    /// Remove a line. Returns whether it was present.
    pub fn remove(&mut self, key: &VariantKey) -> bool {
        let before = self.items.len();
        self.items.retain(|item| &item.id != key);
        self.items.len() != before
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a CartItem;
    type IntoIter = std::slice::Iter<'a, CartItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
