//! Display data and templates for the cart views.
//!
//! The views never hold cart state. Each render builds a [`CartView`] from
//! the store's current cart and renders it from scratch.

use askama::Template;
use brume_core::{Cart, CartItem, format_amount};

/// Element ids shared between the templates and the views.
pub mod ids {
    /// Page body, where the drawer is mounted.
    pub const PAGE_BODY: &str = "body";
    /// Header insertion point for the cart button.
    pub const HEADER_ACTIONS: &str = "headerActions";
    /// Full-screen backdrop behind the drawer.
    pub const OVERLAY: &str = "cartOverlay";
    /// The drawer panel.
    pub const DRAWER: &str = "cartDrawer";
    /// Drawer body holding the line items.
    pub const DRAWER_BODY: &str = "cartDrawerBody";
    /// Drawer footer holding the total and checkout button.
    pub const DRAWER_FOOTER: &str = "cartDrawerFooter";
    /// Total amount text.
    pub const TOTAL_AMOUNT: &str = "cartTotalAmount";
    /// Header cart button.
    pub const CART_BUTTON: &str = "headerCartBtn";
    /// Count badge inside the cart button.
    pub const BADGE: &str = "cartBadge";
    /// Label naming the selected variant.
    pub const SELECTOR_LABEL: &str = "colorSelectorLabel";

    /// Id of the swatch for a variant.
    #[must_use]
    pub fn swatch(variant: &str) -> String {
        format!("swatch-{variant}")
    }
}

/// CSS classes toggled by the views.
pub mod classes {
    pub const IS_OPEN: &str = "is-open";
    pub const IS_HIDDEN: &str = "is-hidden";
    pub const HAS_ITEMS: &str = "has-items";
    pub const BADGE_POP: &str = "cart-badge-pop";
    pub const ACTIVE: &str = "active";
}

/// Cart item display data for templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItemView {
    pub id: String,
    pub name: String,
    pub variant_label: String,
    pub quantity: u32,
    pub price: String,
}

/// Cart display data for templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total: String,
    pub item_count: u32,
}

impl CartView {
    /// Display data for an empty cart in the given currency.
    #[must_use]
    pub fn empty(currency_symbol: &str) -> Self {
        Self {
            items: Vec::new(),
            total: format_amount(currency_symbol, rust_decimal::Decimal::ZERO),
            item_count: 0,
        }
    }

    /// Build display data, using `currency_symbol` for the total.
    ///
    /// Lines carry their own symbol; the total uses the catalog's so an
    /// empty cart still shows a currency.
    #[must_use]
    pub fn from_cart(cart: &Cart, currency_symbol: &str) -> Self {
        Self {
            items: cart.iter().map(CartItemView::from).collect(),
            total: format_amount(currency_symbol, cart.total()),
            item_count: cart.count(),
        }
    }

    /// Whether there is nothing to list.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<&CartItem> for CartItemView {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.id.to_string(),
            name: item.name.clone(),
            variant_label: item.variant_label.clone(),
            quantity: item.quantity,
            price: item.display_price(),
        }
    }
}

/// Drawer shell: backdrop, panel, empty body and footer.
#[derive(Template)]
#[template(path = "cart/drawer.html")]
pub struct DrawerTemplate<'a> {
    pub total: &'a str,
}

/// Drawer body: line items or the empty state.
#[derive(Template)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate<'a> {
    pub cart: &'a CartView,
    pub shop_url: &'a str,
}

/// Header cart button with its count badge.
#[derive(Template)]
#[template(path = "partials/cart_button.html")]
pub struct CartButtonTemplate {
    pub count: u32,
}
