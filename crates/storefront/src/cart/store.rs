//! The cart store: single authority over cart contents.
//!
//! Storage is the source of truth. Every read parses the stored cart, and
//! every mutation runs in the same order within one call:
//! 1. load the stored cart
//! 2. apply the change
//! 3. persist the whole cart under the fixed storage key
//! 4. notify every observer
//!
//! Changes other tabs made are therefore never overwritten by a stale copy.
//!
//! Persistence failures never reach the caller. The store keeps the last
//! cart it saw in memory and serves it while storage cannot be read or is
//! behind a failed write, so the mutation still holds for this page and
//! observers still run; the cart just won't survive a reload. Observer
//! failures (errors or panics) are isolated so one broken view cannot keep
//! the others stale.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use brume_core::{Cart, Catalog, VariantKey};
use rust_decimal::Decimal;
use tokio::task::JoinHandle;
use tracing::instrument;

use crate::error::{RenderError, StorageError, add_breadcrumb};
use crate::storage::{ExternalChanges, KeyValueStorage, StorageEvent};

/// A view callback run after every cart change.
///
/// Observers receive no arguments; they re-read whatever they need from the
/// store. An error is logged by the store and does not stop other observers.
type Observer = Arc<dyn Fn() -> Result<(), RenderError> + Send + Sync>;

/// Handle returned by [`CartStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Outcome of one notification round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Notified {
    /// Observers that completed normally.
    pub succeeded: usize,
    /// Observers that returned an error or panicked.
    pub failed: usize,
}

/// Last cart the store saw, used when storage can't be trusted.
#[derive(Debug, Default)]
struct Fallback {
    cart: Cart,
    /// The last write failed, so storage is behind `cart` until a write
    /// succeeds or another context overwrites the key.
    unsaved: bool,
}

/// Cart state persisted in origin storage.
pub struct CartStore {
    storage: Arc<dyn KeyValueStorage>,
    storage_key: String,
    catalog: Catalog,
    fallback: Mutex<Fallback>,
    observers: RwLock<Vec<(SubscriptionId, Observer)>>,
    next_subscription: AtomicU64,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("storage_key", &self.storage_key)
            .field("fallback", &*self.lock_fallback())
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Open the cart stored under `storage_key`.
    ///
    /// Missing, unreadable or malformed data yields an empty cart.
    pub fn new(
        storage: Arc<dyn KeyValueStorage>,
        storage_key: impl Into<String>,
        catalog: Catalog,
    ) -> Self {
        let storage_key = storage_key.into();
        let cart = read_cart(storage.as_ref(), &storage_key).unwrap_or_else(|e| {
            tracing::warn!(
                error = %e,
                key = %storage_key,
                "Cart storage unreadable, starting empty"
            );
            Cart::new()
        });
        Self {
            storage,
            storage_key,
            catalog,
            fallback: Mutex::new(Fallback {
                cart,
                unsaved: false,
            }),
            observers: RwLock::new(Vec::new()),
            next_subscription: AtomicU64::new(0),
        }
    }

    fn lock_fallback(&self) -> MutexGuard<'_, Fallback> {
        // Cart mutations are single method calls on a value; a panic cannot
        // leave it half-updated.
        self.fallback.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Bring the fallback up to date with storage, unless storage is behind
    /// it or unreadable.
    fn refresh(&self, fallback: &mut Fallback) {
        if fallback.unsaved {
            return;
        }
        match read_cart(self.storage.as_ref(), &self.storage_key) {
            Ok(cart) => fallback.cart = cart,
            Err(e) => {
                tracing::debug!(error = %e, "Cart storage unreadable, using last known cart");
            }
        }
    }

    fn with_cart<R>(&self, read: impl FnOnce(&Cart) -> R) -> R {
        let mut fallback = self.lock_fallback();
        self.refresh(&mut fallback);
        read(&fallback.cart)
    }

    /// The storage key this cart lives under.
    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// The catalog new lines are built from.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    // ── Read ────────────────────────────────────

    /// Current lines in insertion order.
    #[must_use]
    pub fn items(&self) -> Cart {
        self.with_cart(Cart::clone)
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.with_cart(Cart::count)
    }

    /// Sum of `unit_price × quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.with_cart(Cart::total)
    }

    /// Quantity of one line, if present.
    #[must_use]
    pub fn quantity_of(&self, key: &VariantKey) -> Option<u32> {
        self.with_cart(|cart| cart.get(key).map(|item| item.quantity))
    }

    // ── Write ───────────────────────────────────

    /// Add one unit of a variant.
    #[instrument(skip(self), fields(variant = %key))]
    pub fn add_item(&self, key: &VariantKey) {
        add_breadcrumb("cart", "Added item", Some(&[("variant", key.as_str())]));
        self.mutate(|cart| {
            cart.add(key, &self.catalog);
            true
        });
    }

    /// Set a line's quantity. Zero or below removes the line; an absent
    /// line is left absent.
    #[instrument(skip(self), fields(variant = %key))]
    pub fn set_quantity(&self, key: &VariantKey, quantity: i64) {
        let quantity_text = quantity.to_string();
        add_breadcrumb(
            "cart",
            "Changed quantity",
            Some(&[("variant", key.as_str()), ("quantity", &quantity_text)]),
        );
        self.mutate(|cart| cart.set_quantity(key, quantity));
    }

    /// Remove a line regardless of quantity.
    #[instrument(skip(self), fields(variant = %key))]
    pub fn remove_item(&self, key: &VariantKey) {
        add_breadcrumb("cart", "Removed item", Some(&[("variant", key.as_str())]));
        self.mutate(|cart| cart.remove(key));
    }

    /// Remove every line.
    #[instrument(skip(self))]
    pub fn clear(&self) {
        add_breadcrumb("cart", "Cleared cart", None);
        self.mutate(|cart| {
            let changed = !cart.is_empty();
            cart.clear();
            changed
        });
    }

    /// Load, apply a mutation, persist, then notify.
    ///
    /// Observers are notified even when the mutation was a no-op, so every
    /// call produces exactly one notification round.
    fn mutate(&self, apply: impl FnOnce(&mut Cart) -> bool) -> Notified {
        {
            let mut fallback = self.lock_fallback();
            self.refresh(&mut fallback);
            let changed = apply(&mut fallback.cart);
            tracing::debug!(changed, count = fallback.cart.count(), "cart mutated");
            // Persist under the lock so writes reach storage in mutation order.
            fallback.unsaved = !self.persist(&fallback.cart);
        }
        self.notify()
    }

    /// Write the cart. Returns whether storage now holds it.
    fn persist(&self, cart: &Cart) -> bool {
        let payload = match cart.to_json() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize cart, keeping it in memory only");
                return false;
            }
        };

        match self.storage.set_item(&self.storage_key, &payload) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    key = %self.storage_key,
                    "Failed to persist cart, keeping it in memory only"
                );
                false
            }
        }
    }

    // ── Events ──────────────────────────────────

    /// Register an observer.
    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn() -> Result<(), RenderError> + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(observer)));
        id
    }

    /// Remove an observer. Returns whether it was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.observers.write().unwrap_or_else(PoisonError::into_inner);
        let before = observers.len();
        observers.retain(|(sub, _)| *sub != id);
        observers.len() != before
    }

    /// Number of registered observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Run every observer once, isolating failures.
    ///
    /// The observer list is snapshotted first, so observers may subscribe,
    /// unsubscribe or even mutate the cart without deadlocking.
    fn notify(&self) -> Notified {
        let observers: Vec<Observer> = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();

        let mut notified = Notified::default();
        for observer in observers {
            match panic::catch_unwind(AssertUnwindSafe(|| observer())) {
                Ok(Ok(())) => notified.succeeded += 1,
                Ok(Err(e)) => {
                    notified.failed += 1;
                    tracing::warn!(error = %e, "Cart observer failed");
                }
                Err(payload) => {
                    notified.failed += 1;
                    tracing::error!(panic = panic_message(payload.as_ref()), "Cart observer panicked");
                }
            }
        }
        notified
    }

    // ── Cross-tab sync ──────────────────────────

    /// React to a change made by another browsing context.
    ///
    /// Reloads from storage and notifies observers when the event concerns
    /// this cart's key. Returns whether it did. The other context's write
    /// supersedes any change this store failed to save.
    pub fn handle_storage_event(&self, event: &StorageEvent) -> bool {
        if !event.affects(&self.storage_key) {
            return false;
        }
        tracing::debug!(source = %event.source, "external cart change");
        {
            let mut fallback = self.lock_fallback();
            fallback.unsaved = false;
            self.refresh(&mut fallback);
        }
        self.notify();
        true
    }

    /// Apply every external change already delivered, without waiting.
    ///
    /// Returns how many events concerned this cart.
    pub fn sync_pending(&self, changes: &mut ExternalChanges) -> usize {
        let mut handled = 0;
        while let Some(event) = changes.try_recv() {
            if self.handle_storage_event(&event) {
                handled += 1;
            }
        }
        handled
    }

    /// Spawn a task that applies external changes as they arrive.
    ///
    /// The task holds only a weak reference and ends when the store is
    /// dropped or the origin goes away.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn listen(self: &Arc<Self>, mut changes: ExternalChanges) -> JoinHandle<()> {
        let store = Arc::downgrade(self);
        tokio::spawn(async move {
            while let Some(event) = changes.recv().await {
                let Some(store) = store.upgrade() else {
                    break;
                };
                store.handle_storage_event(&event);
            }
            tracing::debug!("storage listener stopped");
        })
    }
}

/// Read the stored cart. An absent or malformed payload is an empty cart;
/// only a storage failure is an error.
fn read_cart(storage: &dyn KeyValueStorage, key: &str) -> Result<Cart, StorageError> {
    Ok(match storage.get_item(key)? {
        Some(payload) => Cart::from_json(&payload).unwrap_or_else(|e| {
            tracing::warn!(error = %e, key, "Stored cart is malformed, treating it as empty");
            Cart::new()
        }),
        None => Cart::new(),
    })
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
