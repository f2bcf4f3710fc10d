//! Slide-out cart drawer.
//!
//! The drawer owns exactly one piece of state, whether it is open. The
//! line items, total and empty state are re-rendered from the store on
//! every change notification.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use askama::Template;
use brume_core::VariantKey;
use tracing::instrument;

use super::checkout::CheckoutFlow;
use super::store::{CartStore, SubscriptionId};
use super::views::{CartItemsTemplate, CartView, DrawerTemplate, classes, ids};
use crate::error::{RenderError, add_breadcrumb};
use crate::surface::Surface;

/// Drawer visibility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DrawerState {
    #[default]
    Closed,
    Open,
}

/// A user gesture inside the drawer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawerEvent {
    /// Quantity minus button on a line.
    Decrement(VariantKey),
    /// Quantity plus button on a line.
    Increment(VariantKey),
    /// Trash button on a line.
    Remove(VariantKey),
    /// Click on the full-screen backdrop.
    Backdrop,
    /// Click on the close button.
    CloseButton,
    /// Click on the checkout button.
    Checkout,
}

impl DrawerEvent {
    /// Decode a click from its `data-action` and `data-color` attributes.
    ///
    /// The `data-color` value is taken verbatim: it was rendered from a
    /// stored line id, which must be addressed exactly as stored. Returns
    /// `None` for unknown actions and for line actions without a variant.
    #[must_use]
    pub fn from_action(action: &str, variant: Option<&str>) -> Option<Self> {
        let key = || variant.map(VariantKey::new);
        match action {
            "decrement" => key().map(Self::Decrement),
            "increment" => key().map(Self::Increment),
            "remove" => key().map(Self::Remove),
            "backdrop" => Some(Self::Backdrop),
            "close" => Some(Self::CloseButton),
            "checkout" => Some(Self::Checkout),
            _ => None,
        }
    }
}

/// The cart drawer mounted on a surface.
pub struct CartDrawer {
    store: Arc<CartStore>,
    surface: Arc<dyn Surface>,
    checkout: Arc<dyn CheckoutFlow>,
    shop_url: String,
    state: Mutex<DrawerState>,
    rendered: Mutex<Option<CartView>>,
    subscription: OnceLock<SubscriptionId>,
}

impl CartDrawer {
    /// Inject the drawer markup into the page body, subscribe to the store
    /// and render the current cart.
    ///
    /// # Errors
    ///
    /// Returns an error if a template fails to render.
    pub fn mount(
        store: Arc<CartStore>,
        surface: Arc<dyn Surface>,
        checkout: Arc<dyn CheckoutFlow>,
        shop_url: impl Into<String>,
    ) -> Result<Arc<Self>, RenderError> {
        let currency = store.catalog().product().price.currency_symbol.clone();
        let shell = DrawerTemplate {
            total: &CartView::empty(&currency).total,
        }
        .render()?;
        surface.append_html(ids::PAGE_BODY, &shell);

        let drawer = Arc::new(Self {
            store: Arc::clone(&store),
            surface,
            checkout,
            shop_url: shop_url.into(),
            state: Mutex::new(DrawerState::Closed),
            rendered: Mutex::new(None),
            subscription: OnceLock::new(),
        });

        let weak = Arc::downgrade(&drawer);
        let id = store.subscribe(move || weak.upgrade().ok_or(RenderError::Detached)?.render());
        let _ = drawer.subscription.set(id);

        drawer.render()?;
        Ok(drawer)
    }

    fn lock_state(&self) -> MutexGuard<'_, DrawerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current visibility.
    #[must_use]
    pub fn state(&self) -> DrawerState {
        *self.lock_state()
    }

    /// Whether the drawer is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state() == DrawerState::Open
    }

    /// What the drawer last rendered.
    #[must_use]
    pub fn rendered(&self) -> Option<CartView> {
        self.rendered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // ── Open / Close ────────────────────────────

    /// Show the drawer and lock page scrolling.
    pub fn open(&self) {
        *self.lock_state() = DrawerState::Open;
        self.apply_visibility(true);
    }

    /// Hide the drawer and restore page scrolling.
    pub fn close(&self) {
        *self.lock_state() = DrawerState::Closed;
        self.apply_visibility(false);
    }

    fn apply_visibility(&self, open: bool) {
        self.surface.set_class(ids::OVERLAY, classes::IS_OPEN, open);
        self.surface.set_class(ids::DRAWER, classes::IS_OPEN, open);
        self.surface.set_scroll_locked(open);
    }

    // ── Render ──────────────────────────────────

    /// Redraw line items, total and footer from the store's current cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the line-item template fails to render.
    pub fn render(&self) -> Result<(), RenderError> {
        let cart = self.store.items();
        let currency = &self.store.catalog().product().price.currency_symbol;
        let view = CartView::from_cart(&cart, currency);

        let body = CartItemsTemplate {
            cart: &view,
            shop_url: &self.shop_url,
        }
        .render()?;

        self.surface.set_inner_html(ids::DRAWER_BODY, &body);
        self.surface
            .set_class(ids::DRAWER_FOOTER, classes::IS_HIDDEN, view.is_empty());
        self.surface.set_text(ids::TOTAL_AMOUNT, &view.total);

        *self.rendered.lock().unwrap_or_else(PoisonError::into_inner) = Some(view);
        Ok(())
    }

    // ── Event Handlers ──────────────────────────

    /// Apply a gesture.
    #[instrument(skip(self))]
    pub fn handle(&self, event: DrawerEvent) {
        match event {
            DrawerEvent::Decrement(key) => {
                if let Some(quantity) = self.store.quantity_of(&key) {
                    self.store.set_quantity(&key, i64::from(quantity) - 1);
                }
            }
            DrawerEvent::Increment(key) => {
                if let Some(quantity) = self.store.quantity_of(&key) {
                    self.store.set_quantity(&key, i64::from(quantity) + 1);
                }
            }
            DrawerEvent::Remove(key) => self.store.remove_item(&key),
            DrawerEvent::Backdrop | DrawerEvent::CloseButton => self.close(),
            DrawerEvent::Checkout => {
                add_breadcrumb("cart", "Started checkout", None);
                self.checkout.begin(&self.store.items());
            }
        }
    }

    /// Handle a page-level key press. Escape closes the drawer, but only
    /// while it is open. Returns whether the key was consumed.
    pub fn handle_key(&self, key: &str) -> bool {
        if key == "Escape" && self.is_open() {
            self.close();
            true
        } else {
            false
        }
    }
}

impl Drop for CartDrawer {
    fn drop(&mut self) {
        if let Some(id) = self.subscription.get() {
            self.store.unsubscribe(*id);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use brume_core::Catalog;

    use super::*;
    use crate::cart::checkout::ComingSoonCheckout;
    use crate::storage::MemoryOrigin;
    use crate::surface::MemorySurface;

    fn key(s: &str) -> VariantKey {
        VariantKey::new(s)
    }

    fn setup() -> (Arc<CartStore>, Arc<MemorySurface>, Arc<CartDrawer>) {
        let store = Arc::new(CartStore::new(
            Arc::new(MemoryOrigin::new().context()),
            "brume_cart",
            Catalog::brume(),
        ));
        let surface = Arc::new(MemorySurface::new());
        let checkout = Arc::new(ComingSoonCheckout::new(surface.clone()));
        let drawer =
            CartDrawer::mount(Arc::clone(&store), surface.clone(), checkout, "/buy.html").unwrap();
        (store, surface, drawer)
    }

    #[test]
    fn test_mount_renders_empty_state() {
        let (_store, surface, drawer) = setup();

        assert!(surface.inner_html(ids::PAGE_BODY).unwrap().contains("cartDrawer"));
        let body = surface.inner_html(ids::DRAWER_BODY).unwrap();
        assert!(body.contains("Your cart is empty"));
        assert!(surface.has_class(ids::DRAWER_FOOTER, classes::IS_HIDDEN));
        assert_eq!(drawer.state(), DrawerState::Closed);
    }

    #[test]
    fn test_renders_on_every_change() {
        let (store, surface, drawer) = setup();

        store.add_item(&key("silver"));
        let body = surface.inner_html(ids::DRAWER_BODY).unwrap();
        assert!(body.contains("data-color=\"silver\""));
        assert!(!surface.has_class(ids::DRAWER_FOOTER, classes::IS_HIDDEN));
        assert_eq!(surface.text(ids::TOTAL_AMOUNT).as_deref(), Some("Dhs. 395.00"));

        store.clear();
        assert!(drawer.rendered().unwrap().is_empty());
        assert!(surface.has_class(ids::DRAWER_FOOTER, classes::IS_HIDDEN));
        assert_eq!(surface.text(ids::TOTAL_AMOUNT).as_deref(), Some("Dhs. 0.00"));
    }

    #[test]
    fn test_open_close_toggle_scroll_lock() {
        let (_store, surface, drawer) = setup();

        drawer.open();
        assert!(drawer.is_open());
        assert!(surface.has_class(ids::DRAWER, classes::IS_OPEN));
        assert!(surface.has_class(ids::OVERLAY, classes::IS_OPEN));
        assert!(surface.scroll_locked());

        drawer.handle(DrawerEvent::Backdrop);
        assert!(!drawer.is_open());
        assert!(!surface.has_class(ids::DRAWER, classes::IS_OPEN));
        assert!(!surface.scroll_locked());

        drawer.open();
        drawer.handle(DrawerEvent::CloseButton);
        assert_eq!(drawer.state(), DrawerState::Closed);
    }

    #[test]
    fn test_escape_only_closes_when_open() {
        let (_store, _surface, drawer) = setup();

        assert!(!drawer.handle_key("Escape"));
        drawer.open();
        assert!(!drawer.handle_key("Enter"));
        assert!(drawer.is_open());
        assert!(drawer.handle_key("Escape"));
        assert!(!drawer.is_open());
    }

    #[test]
    fn test_quantity_controls() {
        let (store, _surface, drawer) = setup();
        store.add_item(&key("silver"));

        drawer.handle(DrawerEvent::Increment(key("silver")));
        assert_eq!(store.quantity_of(&key("silver")), Some(2));

        drawer.handle(DrawerEvent::Decrement(key("silver")));
        drawer.handle(DrawerEvent::Decrement(key("silver")));
        assert_eq!(store.quantity_of(&key("silver")), None);
        assert!(drawer.rendered().unwrap().is_empty());
    }

    #[test]
    fn test_remove_ignores_quantity() {
        let (store, _surface, drawer) = setup();
        store.add_item(&key("white"));
        store.set_quantity(&key("white"), 5);

        drawer.handle(DrawerEvent::Remove(key("white")));
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_controls_on_absent_line_do_nothing() {
        let (store, _surface, drawer) = setup();
        drawer.handle(DrawerEvent::Increment(key("silver")));
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_checkout_delegates() {
        let (_store, surface, drawer) = setup();
        drawer.handle(DrawerEvent::Checkout);
        assert_eq!(surface.alerts(), [ComingSoonCheckout::MESSAGE]);
    }

    #[test]
    fn test_from_action() {
        assert_eq!(
            DrawerEvent::from_action("decrement", Some("silver")),
            Some(DrawerEvent::Decrement(key("silver")))
        );
        assert_eq!(
            DrawerEvent::from_action("close", None),
            Some(DrawerEvent::CloseButton)
        );
        assert_eq!(DrawerEvent::from_action("remove", None), None);
        assert_eq!(
            DrawerEvent::from_action("remove", Some(" silver")),
            Some(DrawerEvent::Remove(key(" silver")))
        );
        assert_eq!(DrawerEvent::from_action("dance", Some("silver")), None);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let (store, _surface, drawer) = setup();
        assert_eq!(store.observer_count(), 1);
        drop(drawer);
        assert_eq!(store.observer_count(), 0);
    }
}
