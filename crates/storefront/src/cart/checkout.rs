//! Checkout hand-off.

use std::sync::Arc;

use brume_core::Cart;

use crate::surface::Surface;

/// Starts the external checkout flow for a cart.
pub trait CheckoutFlow: Send + Sync {
    /// Begin checkout with the cart's current contents.
    fn begin(&self, cart: &Cart);
}

/// Placeholder until a payment provider is wired up: tells the shopper
/// checkout is not available yet.
pub struct ComingSoonCheckout {
    surface: Arc<dyn Surface>,
}

impl ComingSoonCheckout {
    pub const MESSAGE: &'static str = "Checkout coming soon!";

    #[must_use]
    pub fn new(surface: Arc<dyn Surface>) -> Self {
        Self { surface }
    }
}

impl CheckoutFlow for ComingSoonCheckout {
    fn begin(&self, cart: &Cart) {
        tracing::info!(lines = cart.len(), count = cart.count(), "checkout requested");
        self.surface.alert(Self::MESSAGE);
    }
}
