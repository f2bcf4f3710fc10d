//! Integration tests for the Brume storefront cart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p brume-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_store` - Store operations and persistence through real backends
//! - `page_flows` - Drawer, badge and selector driven through page events
//! - `cross_tab` - Several tabs of one origin staying in sync
//!
//! Every test runs headless: pages render onto a [`MemorySurface`] and the
//! badge timer runs on a [`ManualScheduler`].

use std::sync::Arc;
use std::time::Duration;

use brume_storefront::config::CartConfig;
use brume_storefront::page::{CartPage, PageServices};
use brume_storefront::scheduler::ManualScheduler;
use brume_storefront::storage::{BrowsingContext, ExternalChanges, KeyValueStorage, MemoryOrigin};
use brume_storefront::surface::MemorySurface;

/// Default badge emphasis duration used by [`CartConfig::default`].
pub const POP: Duration = Duration::from_millis(300);

/// One mounted page with handles to everything it renders through.
pub struct Tab {
    pub page: CartPage,
    pub surface: Arc<MemorySurface>,
    pub scheduler: Arc<ManualScheduler>,
    pub changes: Option<ExternalChanges>,
}

impl Tab {
    /// Open a new tab on `origin` with default configuration.
    ///
    /// The tab's external change stream is kept in [`Tab::changes`] so a test
    /// can either pump it with [`Tab::sync`] or hand it to a listener.
    ///
    /// # Panics
    ///
    /// Panics if the page fails to mount.
    #[must_use]
    pub fn open(origin: &MemoryOrigin) -> Self {
        let context: BrowsingContext = origin.context();
        let changes = context.external_changes();
        let mut tab = Self::on_storage(Arc::new(context), CartConfig::default());
        tab.changes = Some(changes);
        tab
    }

    /// Mount a page over any storage backend.
    ///
    /// # Panics
    ///
    /// Panics if the page fails to mount.
    #[must_use]
    pub fn on_storage(storage: Arc<dyn KeyValueStorage>, config: CartConfig) -> Self {
        let surface = Arc::new(MemorySurface::new());
        let scheduler = Arc::new(ManualScheduler::new());
        let services = PageServices::new(storage, surface.clone(), scheduler.clone());
        let page = CartPage::mount(config, services).unwrap_or_else(|e| panic!("mount failed: {e}"));
        Self {
            page,
            surface,
            scheduler,
            changes: None,
        }
    }

    /// Apply every change other tabs have made so far. Returns how many
    /// concerned the cart.
    pub fn sync(&mut self) -> usize {
        self.changes
            .as_mut()
            .map_or(0, |changes| self.page.store().sync_pending(changes))
    }

    /// Text currently shown in the badge.
    #[must_use]
    pub fn badge_text(&self) -> String {
        self.surface
            .text(brume_storefront::cart::views::ids::BADGE)
            .unwrap_or_default()
    }
}
