//! Per-origin key-value storage.
//!
//! # Architecture
//!
//! - [`KeyValueStorage`] is the narrow string-to-string interface the cart
//!   persists through (the shape of browser `localStorage`)
//! - [`MemoryOrigin`] is one origin's storage shared by any number of
//!   [`BrowsingContext`]s (tabs); each write is broadcast to the *other*
//!   contexts as a [`StorageEvent`]
//! - [`FileStorage`] is a durable directory-backed store, one file per key
//!
//! Writes are atomic per key. There is no cross-context locking; the last
//! write wins.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::{BrowsingContext, MemoryOrigin};

use core::fmt;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use uuid::Uuid;

use crate::config::CartConfig;
use crate::error::StorageError;

/// String key-value storage scoped to one origin.
pub trait KeyValueStorage: Send + Sync {
    /// Read a value. `Ok(None)` when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unavailable or out of space.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value. Succeeds when the key is already absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// Identity of one browsing context (tab or window).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(Uuid);

impl ContextId {
    /// Generate a fresh context id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A change made to origin storage by some browsing context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    /// Changed key, or `None` when the whole storage may have changed.
    pub key: Option<String>,
    /// Value after the change; `None` when removed.
    pub new_value: Option<String>,
    /// Context that made the change.
    pub source: ContextId,
}

impl StorageEvent {
    /// Whether this event may affect `key`.
    #[must_use]
    pub fn affects(&self, key: &str) -> bool {
        self.key.as_deref().is_none_or(|changed| changed == key)
    }
}

/// Stream of storage changes made by *other* contexts of the same origin.
///
/// Events written by the owning context are filtered out, so a context
/// never observes its own writes through this path.
#[derive(Debug)]
pub struct ExternalChanges {
    owner: ContextId,
    receiver: broadcast::Receiver<StorageEvent>,
}

impl ExternalChanges {
    pub(crate) const fn new(owner: ContextId, receiver: broadcast::Receiver<StorageEvent>) -> Self {
        Self { owner, receiver }
    }

    /// Wait for the next external change.
    ///
    /// Returns `None` once the origin is gone. If the receiver fell behind
    /// and missed events, a storage-wide event (`key == None`) is returned
    /// instead so the listener resynchronizes everything.
    pub async fn recv(&mut self) -> Option<StorageEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.source == self.owner => {}
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "storage event receiver lagged, resyncing");
                    return Some(self.resync_event());
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next pending external change without waiting.
    pub fn try_recv(&mut self) -> Option<StorageEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if event.source == self.owner => {}
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "storage event receiver lagged, resyncing");
                    return Some(self.resync_event());
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    const fn resync_event(&self) -> StorageEvent {
        StorageEvent {
            key: None,
            new_value: None,
            source: self.owner,
        }
    }
}

/// Open the storage backend named by the configuration.
///
/// File-backed when a storage directory is configured; otherwise a fresh
/// in-memory origin seen through a single context.
#[must_use]
pub fn from_config(config: &CartConfig) -> Arc<dyn KeyValueStorage> {
    match &config.storage_dir {
        Some(dir) => {
            tracing::info!(dir = %dir.display(), "Using file-backed cart storage");
            Arc::new(FileStorage::new(dir.clone()))
        }
        None => {
            tracing::info!("Using in-memory cart storage");
            Arc::new(MemoryOrigin::new().context())
        }
    }
}
