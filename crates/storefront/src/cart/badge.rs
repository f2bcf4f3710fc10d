//! Header cart button and its count badge.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;

use askama::Template;

use super::store::{CartStore, SubscriptionId};
use super::views::{CartButtonTemplate, classes, ids};
use crate::error::RenderError;
use crate::scheduler::Scheduler;
use crate::surface::Surface;

#[derive(Debug, Default)]
struct BadgeState {
    /// Count currently shown; `None` before the first render.
    displayed: Option<u32>,
    /// Bumped on every emphasis so stale removal tasks can tell.
    pop_generation: u64,
    popping: bool,
}

/// The header cart button showing the cart's item count.
///
/// The count gets a short emphasis animation whenever it goes up. Removing
/// the emphasis class is a deferred task that is never cancelled; when the
/// count rises again before it fires, the newer emphasis wins and the stale
/// task does nothing.
pub struct CartBadge {
    store: Arc<CartStore>,
    surface: Arc<dyn Surface>,
    scheduler: Arc<dyn Scheduler>,
    pop_duration: Duration,
    state: Mutex<BadgeState>,
    subscription: OnceLock<SubscriptionId>,
}

impl CartBadge {
    /// Insert the cart button into the header, subscribe to the store and
    /// show the current count.
    ///
    /// # Errors
    ///
    /// Returns an error if the button template fails to render.
    pub fn mount(
        store: Arc<CartStore>,
        surface: Arc<dyn Surface>,
        scheduler: Arc<dyn Scheduler>,
        pop_duration: Duration,
    ) -> Result<Arc<Self>, RenderError> {
        let button = CartButtonTemplate { count: 0 }.render()?;
        surface.append_html(ids::HEADER_ACTIONS, &button);

        let badge = Arc::new(Self {
            store: Arc::clone(&store),
            surface,
            scheduler,
            pop_duration,
            state: Mutex::new(BadgeState::default()),
            subscription: OnceLock::new(),
        });

        let weak = Arc::downgrade(&badge);
        let id = store.subscribe(move || {
            weak.upgrade().ok_or(RenderError::Detached)?.update();
            Ok(())
        });
        let _ = badge.subscription.set(id);

        badge.update();
        Ok(badge)
    }

    fn lock_state(&self) -> MutexGuard<'_, BadgeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count currently displayed.
    #[must_use]
    pub fn displayed_count(&self) -> u32 {
        self.lock_state().displayed.unwrap_or(0)
    }

    /// Whether the emphasis animation is currently applied.
    #[must_use]
    pub fn is_popping(&self) -> bool {
        self.lock_state().popping
    }

    // ── Update Badge ────────────────────────────

    /// Re-read the count and redraw the badge.
    pub fn update(self: &Arc<Self>) {
        let count = self.store.count();

        let pop = {
            let mut state = self.lock_state();
            let previous = state.displayed.replace(count);
            if previous.is_some_and(|shown| count > shown) {
                state.pop_generation += 1;
                state.popping = true;
                Some(state.pop_generation)
            } else {
                None
            }
        };

        self.surface.set_text(ids::BADGE, &count.to_string());
        self.surface.set_class(ids::BADGE, classes::HAS_ITEMS, count > 0);

        if let Some(generation) = pop {
            // Remove first so a still-running animation restarts.
            self.surface.set_class(ids::BADGE, classes::BADGE_POP, false);
            self.surface.set_class(ids::BADGE, classes::BADGE_POP, true);

            let weak = Arc::downgrade(self);
            self.scheduler.defer(
                self.pop_duration,
                Box::new(move || {
                    if let Some(badge) = weak.upgrade() {
                        badge.end_pop(generation);
                    }
                }),
            );
        }
    }

    fn end_pop(&self, generation: u64) {
        let current = {
            let mut state = self.lock_state();
            let current = state.pop_generation == generation;
            if current {
                state.popping = false;
            }
            current
        };
        if current {
            self.surface.set_class(ids::BADGE, classes::BADGE_POP, false);
        }
    }
}

impl Drop for CartBadge {
    fn drop(&mut self) {
        if let Some(id) = self.subscription.get() {
            self.store.unsubscribe(*id);
        }
    }
}
