//! Per-page wiring of the cart store and its views.

use std::sync::{Arc, Mutex, PoisonError};

use brume_core::Catalog;
use tokio::task::JoinHandle;

use crate::cart::{
    CartBadge, CartDrawer, CartStore, CheckoutFlow, ComingSoonCheckout, DrawerEvent,
    VariantSelector,
};
use crate::config::CartConfig;
use crate::error::RenderError;
use crate::scheduler::Scheduler;
use crate::storage::{ExternalChanges, KeyValueStorage};
use crate::surface::Surface;

/// Collaborators a page is mounted with.
pub struct PageServices {
    pub storage: Arc<dyn KeyValueStorage>,
    pub surface: Arc<dyn Surface>,
    pub scheduler: Arc<dyn Scheduler>,
    pub catalog: Catalog,
    /// Defaults to [`ComingSoonCheckout`] on the page's surface.
    pub checkout: Option<Arc<dyn CheckoutFlow>>,
}

impl PageServices {
    /// Services selling the default catalog with the placeholder checkout.
    #[must_use]
    pub fn new(
        storage: Arc<dyn KeyValueStorage>,
        surface: Arc<dyn Surface>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        Self {
            storage,
            surface,
            scheduler,
            catalog: Catalog::default(),
            checkout: None,
        }
    }

    #[must_use]
    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    #[must_use]
    pub fn with_checkout(mut self, checkout: Arc<dyn CheckoutFlow>) -> Self {
        self.checkout = Some(checkout);
        self
    }
}

/// One page load's cart: the store plus every view mounted on the page.
///
/// This struct is cheaply cloneable via `Arc`. The cross-tab listener, if
/// started, is stopped when the last clone is dropped.
#[derive(Clone)]
pub struct CartPage {
    inner: Arc<PageInner>,
}

struct PageInner {
    config: CartConfig,
    store: Arc<CartStore>,
    drawer: Arc<CartDrawer>,
    badge: Arc<CartBadge>,
    selector: VariantSelector,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for PageInner {
    fn drop(&mut self) {
        if let Some(handle) = self
            .listener
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }
}

impl CartPage {
    /// Build the store and mount the drawer, badge and selector.
    ///
    /// # Errors
    ///
    /// Returns an error if any view's markup fails to render.
    pub fn mount(config: CartConfig, services: PageServices) -> Result<Self, RenderError> {
        let PageServices {
            storage,
            surface,
            scheduler,
            catalog,
            checkout,
        } = services;

        let store = Arc::new(CartStore::new(storage, config.storage_key.clone(), catalog));
        let checkout = checkout
            .unwrap_or_else(|| Arc::new(ComingSoonCheckout::new(Arc::clone(&surface))));

        let drawer = CartDrawer::mount(
            Arc::clone(&store),
            Arc::clone(&surface),
            checkout,
            config.shop_url.clone(),
        )?;
        let badge = CartBadge::mount(
            Arc::clone(&store),
            Arc::clone(&surface),
            scheduler,
            config.badge_pop,
        )?;
        let selector = VariantSelector::new(Arc::clone(&store), Arc::clone(&drawer), surface);

        tracing::info!(
            key = %config.storage_key,
            count = store.count(),
            "Cart page mounted"
        );

        Ok(Self {
            inner: Arc::new(PageInner {
                config,
                store,
                drawer,
                badge,
                selector,
                listener: Mutex::new(None),
            }),
        })
    }

    /// Follow changes made in other tabs. Replaces any earlier listener.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn listen(&self, changes: ExternalChanges) {
        let handle = self.inner.store.listen(changes);
        let previous = self
            .inner
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    #[must_use]
    pub fn config(&self) -> &CartConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn store(&self) -> &Arc<CartStore> {
        &self.inner.store
    }

    #[must_use]
    pub fn drawer(&self) -> &Arc<CartDrawer> {
        &self.inner.drawer
    }

    #[must_use]
    pub fn badge(&self) -> &Arc<CartBadge> {
        &self.inner.badge
    }

    #[must_use]
    pub fn selector(&self) -> &VariantSelector {
        &self.inner.selector
    }

    // ── Page Events ─────────────────────────────

    /// Route a click by its `data-action` (and `data-color`, when the
    /// element has one). Returns whether any cart component handled it.
    pub fn click(&self, action: &str, variant: Option<&str>) -> bool {
        match action {
            "open-cart" => {
                self.inner.drawer.open();
                true
            }
            "add-to-cart" => {
                self.inner.selector.add_to_cart();
                true
            }
            "select-color" => variant.is_some_and(|raw| {
                self.inner.selector.select_from_attribute(raw).is_ok()
            }),
            _ => match DrawerEvent::from_action(action, variant) {
                Some(event) => {
                    self.inner.drawer.handle(event);
                    true
                }
                None => false,
            },
        }
    }

    /// Route a page-level key press. Returns whether it was consumed.
    pub fn key_down(&self, key: &str) -> bool {
        self.inner.drawer.handle_key(key)
    }
}
