//! Static product catalog.
//!
//! The landing site sells a single product in several variants. The product
//! name and price apply uniformly to every variant; only the display label
//! differs.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use super::cart::CartItem;
use super::id::VariantKey;
use super::price::Price;

/// The product every variant belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// Canonical display name.
    pub name: String,
    /// Unit price applied to every variant.
    pub price: Price,
}

/// Mapping from variant key to display label, plus the shared product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    product: Product,
    labels: BTreeMap<VariantKey, String>,
}

impl Catalog {
    /// Create a catalog with no known variants.
    #[must_use]
    pub const fn new(product: Product) -> Self {
        Self {
            product,
            labels: BTreeMap::new(),
        }
    }

    /// The Brume filter catalog: Silver and Pearl White at Dhs. 395.00.
    #[must_use]
    pub fn brume() -> Self {
        Self::new(Product {
            name: "brume filter".to_string(),
            price: Price::new(Decimal::new(39_500, 2), "Dhs."),
        })
        .with_variant(VariantKey::new("silver"), "Silver")
        .with_variant(VariantKey::new("white"), "Pearl White")
    }

    /// Register a variant label.
    #[must_use]
    pub fn with_variant(mut self, key: VariantKey, label: impl Into<String>) -> Self {
        self.labels.insert(key, label.into());
        self
    }

    /// The shared product.
    #[must_use]
    pub const fn product(&self) -> &Product {
        &self.product
    }

    /// Whether the key is a known variant.
    #[must_use]
    pub fn contains(&self, key: &VariantKey) -> bool {
        self.labels.contains_key(key)
    }

    /// Display label for a variant, falling back to the raw key.
    #[must_use]
    pub fn label_for(&self, key: &VariantKey) -> String {
        self.labels
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.as_str().to_owned())
    }

    /// Known variants in key order.
    pub fn variants(&self) -> impl Iterator<Item = (&VariantKey, &str)> {
        self.labels.iter().map(|(key, label)| (key, label.as_str()))
    }

    /// Build a fresh cart line (quantity 1) for a variant.
    #[must_use]
    pub fn new_line(&self, key: &VariantKey) -> CartItem {
        CartItem {
            id: key.clone(),
            name: self.product.name.clone(),
            variant_label: self.label_for(key),
            unit_price: self.product.price.amount,
            currency_symbol: self.product.price.currency_symbol.clone(),
            quantity: 1,
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::brume()
    }
}
