//! Variant swatches and the add-to-cart button on the product page.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use brume_core::{VariantKey, VariantKeyError};
use tracing::instrument;

use super::drawer::CartDrawer;
use super::store::CartStore;
use super::views::{classes, ids};
use crate::surface::Surface;

/// Variant selected when the page loads.
pub const DEFAULT_VARIANT: &str = "silver";

/// Tracks the shopper's chosen variant and adds it to the cart.
pub struct VariantSelector {
    store: Arc<CartStore>,
    drawer: Arc<CartDrawer>,
    surface: Arc<dyn Surface>,
    selected: Mutex<VariantKey>,
}

impl VariantSelector {
    /// Create a selector with the default variant selected and shown.
    #[must_use]
    pub fn new(store: Arc<CartStore>, drawer: Arc<CartDrawer>, surface: Arc<dyn Surface>) -> Self {
        let selector = Self {
            store,
            drawer,
            surface,
            selected: Mutex::new(VariantKey::new(DEFAULT_VARIANT)),
        };
        selector.show(&VariantKey::new(DEFAULT_VARIANT));
        selector
    }

    fn lock_selected(&self) -> MutexGuard<'_, VariantKey> {
        self.selected.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The currently selected variant.
    #[must_use]
    pub fn selected(&self) -> VariantKey {
        self.lock_selected().clone()
    }

    /// Select a variant: mark its swatch active and name it in the label.
    pub fn select(&self, key: VariantKey) {
        self.show(&key);
        *self.lock_selected() = key;
    }

    /// Select from a swatch's raw `data-color` attribute.
    ///
    /// # Errors
    ///
    /// Returns an error if the attribute is not a usable variant key.
    pub fn select_from_attribute(&self, raw: &str) -> Result<(), VariantKeyError> {
        self.select(VariantKey::parse(raw)?);
        Ok(())
    }

    fn show(&self, key: &VariantKey) {
        let catalog = self.store.catalog();
        for (variant, _) in catalog.variants() {
            self.surface
                .set_class(&ids::swatch(variant.as_str()), classes::ACTIVE, variant == key);
        }
        self.surface
            .set_text(ids::SELECTOR_LABEL, &catalog.label_for(key));
    }

    /// Add one unit of the selected variant and reveal the drawer.
    #[instrument(skip(self))]
    pub fn add_to_cart(&self) {
        let key = self.selected();
        self.store.add_item(&key);
        self.drawer.open();
    }
}
