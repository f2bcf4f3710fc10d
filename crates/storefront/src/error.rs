//! Error types for the cart and its views.
//!
//! None of these reach the caller of a cart operation. Storage failures
//! degrade to session-only persistence and observer failures are isolated
//! by the store's notification loop; both are logged and recorded as Sentry
//! breadcrumbs so that a later error report shows how the page got there.

use thiserror::Error;

/// Errors from a [`KeyValueStorage`](crate::storage::KeyValueStorage) backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Storage is disabled or otherwise inaccessible (e.g. private browsing).
    #[error("storage unavailable")]
    Unavailable,

    /// Writing the value would exceed the backend's quota.
    #[error("storage quota exceeded: need {needed} bytes, quota is {quota}")]
    QuotaExceeded {
        /// Bytes the origin would hold after the write.
        needed: usize,
        /// Bytes the origin may hold.
        quota: usize,
    },

    /// Filesystem operation failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors produced while rendering a view in response to a cart change.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Template rendering failed.
    #[error("template error: {0}")]
    Template(#[from] askama::Error),

    /// The view was dropped but its subscription is still registered.
    #[error("view is no longer mounted")]
    Detached,
}

/// Add a breadcrumb for a cart action.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error. Without an initialized Sentry client this is a no-op.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("variant", "silver")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
