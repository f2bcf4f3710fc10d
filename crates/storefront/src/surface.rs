//! The rendering surface the cart views draw on.
//!
//! The surface is the page's DOM as far as the cart is concerned: elements
//! addressed by id, with inner HTML, text and CSS classes, plus the page's
//! scroll lock. Views never read state back from it; their own state lives
//! in explicit fields and the surface only receives the rendered result.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A DOM-like rendering target.
pub trait Surface: Send + Sync {
    /// Replace an element's children with `html`.
    fn set_inner_html(&self, element_id: &str, html: &str);

    /// Append `html` to an element's children.
    fn append_html(&self, parent_id: &str, html: &str);

    /// Replace an element's text content.
    fn set_text(&self, element_id: &str, text: &str);

    /// Add (`enabled`) or remove a CSS class on an element.
    fn set_class(&self, element_id: &str, class: &str, enabled: bool);

    /// Suppress (`true`) or restore background page scrolling.
    fn set_scroll_locked(&self, locked: bool);

    /// Show a blocking notice to the user.
    fn alert(&self, message: &str);
}

#[derive(Debug, Default, Clone)]
struct Element {
    html: String,
    text: Option<String>,
    classes: BTreeSet<String>,
    class_adds: HashMap<String, usize>,
}

#[derive(Debug, Default)]
struct SurfaceState {
    elements: HashMap<String, Element>,
    scroll_locked: bool,
    alerts: Vec<String>,
}

/// A surface that keeps everything in memory.
///
/// Used for headless rendering and as the page double in tests.
#[derive(Debug, Default)]
pub struct MemorySurface {
    state: Mutex<SurfaceState>,
}

impl MemorySurface {
    /// Create an empty surface.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SurfaceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// An element's current inner HTML, if it was ever written.
    #[must_use]
    pub fn inner_html(&self, element_id: &str) -> Option<String> {
        self.lock().elements.get(element_id).map(|e| e.html.clone())
    }

    /// An element's current text content, if it was ever set.
    #[must_use]
    pub fn text(&self, element_id: &str) -> Option<String> {
        self.lock()
            .elements
            .get(element_id)
            .and_then(|e| e.text.clone())
    }

    /// Whether an element currently has a class.
    #[must_use]
    pub fn has_class(&self, element_id: &str, class: &str) -> bool {
        self.lock()
            .elements
            .get(element_id)
            .is_some_and(|e| e.classes.contains(class))
    }

    /// How many times a class was added to an element (including re-adds).
    #[must_use]
    pub fn times_class_added(&self, element_id: &str, class: &str) -> usize {
        self.lock()
            .elements
            .get(element_id)
            .and_then(|e| e.class_adds.get(class).copied())
            .unwrap_or(0)
    }

    /// Whether page scrolling is currently suppressed.
    #[must_use]
    pub fn scroll_locked(&self) -> bool {
        self.lock().scroll_locked
    }

    /// Every alert shown so far, oldest first.
    #[must_use]
    pub fn alerts(&self) -> Vec<String> {
        self.lock().alerts.clone()
    }
}

impl Surface for MemorySurface {
    fn set_inner_html(&self, element_id: &str, html: &str) {
        let mut state = self.lock();
        html.clone_into(&mut state.elements.entry(element_id.to_string()).or_default().html);
    }

    fn append_html(&self, parent_id: &str, html: &str) {
        let mut state = self.lock();
        state
            .elements
            .entry(parent_id.to_string())
            .or_default()
            .html
            .push_str(html);
    }

    fn set_text(&self, element_id: &str, text: &str) {
        let mut state = self.lock();
        state.elements.entry(element_id.to_string()).or_default().text = Some(text.to_string());
    }

    fn set_class(&self, element_id: &str, class: &str, enabled: bool) {
        let mut state = self.lock();
        let element = state.elements.entry(element_id.to_string()).or_default();
        if enabled {
            element.classes.insert(class.to_string());
            *element.class_adds.entry(class.to_string()).or_default() += 1;
        } else {
            element.classes.remove(class);
        }
    }

    fn set_scroll_locked(&self, locked: bool) {
        self.lock().scroll_locked = locked;
    }

    fn alert(&self, message: &str) {
        self.lock().alerts.push(message.to_string());
    }
}
