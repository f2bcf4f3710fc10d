//! The cart: a persisted store and the views rendering it.
//!
//! # Architecture
//!
//! - [`CartStore`] owns the cart, persists every change and notifies
//!   subscribers
//! - [`CartDrawer`] and [`CartBadge`] subscribe and re-render from the
//!   store on each notification
//! - [`VariantSelector`] feeds add-to-cart gestures into the store
//!
//! Views hold only their own UI state (drawer visibility, displayed count,
//! selected variant). Cart contents always come from the store.

pub mod badge;
pub mod checkout;
pub mod drawer;
pub mod selector;
pub mod store;
pub mod views;

pub use badge::CartBadge;
pub use checkout::{CheckoutFlow, ComingSoonCheckout};
pub use drawer::{CartDrawer, DrawerEvent, DrawerState};
pub use selector::VariantSelector;
pub use store::{CartStore, SubscriptionId};
pub use views::{CartItemView, CartView};
