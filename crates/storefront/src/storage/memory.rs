//! In-memory origin storage shared between browsing contexts.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::broadcast;

use super::{ContextId, ExternalChanges, KeyValueStorage, StorageEvent};
use crate::error::StorageError;

/// Buffered events per receiver before it is considered lagged.
const EVENT_CAPACITY: usize = 64;

/// Storage for one origin.
///
/// Cloning yields another handle to the same storage. Open a tab on it with
/// [`MemoryOrigin::context`].
#[derive(Clone)]
pub struct MemoryOrigin {
    inner: Arc<OriginInner>,
}

struct OriginInner {
    entries: Mutex<HashMap<String, String>>,
    events: broadcast::Sender<StorageEvent>,
    quota: Option<usize>,
    disabled: AtomicBool,
}

impl Default for MemoryOrigin {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryOrigin {
    /// Create an empty origin without a quota.
    #[must_use]
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create an empty origin that holds at most `bytes` of keys and values.
    #[must_use]
    pub fn with_quota(bytes: usize) -> Self {
        Self::build(Some(bytes))
    }

    fn build(quota: Option<usize>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(OriginInner {
                entries: Mutex::new(HashMap::new()),
                events,
                quota,
                disabled: AtomicBool::new(false),
            }),
        }
    }

    /// Open a new browsing context (tab) on this origin.
    #[must_use]
    pub fn context(&self) -> BrowsingContext {
        BrowsingContext {
            id: ContextId::new(),
            origin: Arc::clone(&self.inner),
        }
    }

    /// Disable or re-enable storage, as private browsing modes do.
    ///
    /// While disabled every read and write fails with
    /// [`StorageError::Unavailable`].
    pub fn set_disabled(&self, disabled: bool) {
        self.inner.disabled.store(disabled, Ordering::SeqCst);
    }

    /// Total bytes of keys and values currently stored.
    #[must_use]
    pub fn used_bytes(&self) -> usize {
        let entries = self.inner.lock_entries();
        usage(&entries)
    }
}

impl OriginInner {
    fn lock_entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // Entries are plain strings; a panic mid-update cannot leave them torn.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_enabled(&self) -> Result<(), StorageError> {
        if self.disabled.load(Ordering::SeqCst) {
            Err(StorageError::Unavailable)
        } else {
            Ok(())
        }
    }

    fn publish(&self, event: StorageEvent) {
        // No receivers is fine: nobody else is listening.
        let _ = self.events.send(event);
    }
}

fn usage(entries: &HashMap<String, String>) -> usize {
    entries.iter().map(|(k, v)| k.len() + v.len()).sum()
}

/// One tab's view of an origin's storage.
#[derive(Clone)]
pub struct BrowsingContext {
    id: ContextId,
    origin: Arc<OriginInner>,
}

impl BrowsingContext {
    /// This context's identity.
    #[must_use]
    pub const fn id(&self) -> ContextId {
        self.id
    }

    /// Subscribe to changes made by other contexts on the same origin.
    ///
    /// Only changes made after this call are delivered.
    #[must_use]
    pub fn external_changes(&self) -> ExternalChanges {
        ExternalChanges::new(self.id, self.origin.events.subscribe())
    }
}

impl KeyValueStorage for BrowsingContext {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.origin.check_enabled()?;
        Ok(self.origin.lock_entries().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.origin.check_enabled()?;
        let changed = {
            let mut entries = self.origin.lock_entries();
            if let Some(quota) = self.origin.quota {
                let current = entries.get(key).map_or(0, |old| key.len() + old.len());
                let needed = usage(&entries) - current + key.len() + value.len();
                if needed > quota {
                    return Err(StorageError::QuotaExceeded { needed, quota });
                }
            }
            let previous = entries.insert(key.to_string(), value.to_string());
            previous.as_deref() != Some(value)
        };

        if changed {
            self.origin.publish(StorageEvent {
                key: Some(key.to_string()),
                new_value: Some(value.to_string()),
                source: self.id,
            });
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.origin.check_enabled()?;
        let removed = self.origin.lock_entries().remove(key).is_some();
        if removed {
            self.origin.publish(StorageEvent {
                key: Some(key.to_string()),
                new_value: None,
                source: self.id,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_contexts_share_entries() {
        let origin = MemoryOrigin::new();
        let a = origin.context();
        let b = origin.context();

        a.set_item("k", "v").unwrap();
        assert_eq!(b.get_item("k").unwrap().as_deref(), Some("v"));
        assert_eq!(b.get_item("missing").unwrap(), None);
    }

    #[test]
    fn test_write_is_broadcast_to_other_contexts_only() {
        let origin = MemoryOrigin::new();
        let a = origin.context();
        let b = origin.context();
        let mut a_changes = a.external_changes();
        let mut b_changes = b.external_changes();

        a.set_item("k", "v").unwrap();

        let event = b_changes.try_recv().unwrap();
        assert_eq!(event.key.as_deref(), Some("k"));
        assert_eq!(event.new_value.as_deref(), Some("v"));
        assert_eq!(event.source, a.id());
        assert!(a_changes.try_recv().is_none());
    }

    #[test]
    fn test_unchanged_write_is_not_broadcast() {
        let origin = MemoryOrigin::new();
        let a = origin.context();
        let mut b_changes = origin.context().external_changes();

        a.set_item("k", "v").unwrap();
        a.set_item("k", "v").unwrap();

        assert!(b_changes.try_recv().is_some());
        assert!(b_changes.try_recv().is_none());
    }

    #[test]
    fn test_remove_broadcasts_once() {
        let origin = MemoryOrigin::new();
        let a = origin.context();
        let mut b_changes = origin.context().external_changes();

        a.set_item("k", "v").unwrap();
        a.remove_item("k").unwrap();
        a.remove_item("k").unwrap();

        assert!(b_changes.try_recv().is_some());
        let removed = b_changes.try_recv().unwrap();
        assert_eq!(removed.new_value, None);
        assert!(b_changes.try_recv().is_none());
    }

    #[test]
    fn test_disabled_storage_fails() {
        let origin = MemoryOrigin::new();
        let tab = origin.context();
        origin.set_disabled(true);

        assert!(matches!(tab.get_item("k"), Err(StorageError::Unavailable)));
        assert!(matches!(
            tab.set_item("k", "v"),
            Err(StorageError::Unavailable)
        ));

        origin.set_disabled(false);
        assert!(tab.set_item("k", "v").is_ok());
    }

    #[test]
    fn test_quota_counts_replaced_value_once() {
        let origin = MemoryOrigin::with_quota(10);
        let tab = origin.context();

        tab.set_item("k", "12345").unwrap();
        tab.set_item("k", "123456789").unwrap();
        assert_eq!(origin.used_bytes(), 10);

        let err = tab.set_item("k", "1234567890").unwrap_err();
        assert!(matches!(
            err,
            StorageError::QuotaExceeded {
                needed: 11,
                quota: 10
            }
        ));
        assert_eq!(tab.get_item("k").unwrap().as_deref(), Some("123456789"));
    }

    #[test]
    fn test_lagged_receiver_gets_resync_event() {
        let origin = MemoryOrigin::new();
        let a = origin.context();
        let b = origin.context();
        let mut b_changes = b.external_changes();

        for i in 0..(EVENT_CAPACITY + 8) {
            a.set_item("k", &i.to_string()).unwrap();
        }

        let event = b_changes.try_recv().unwrap();
        assert_eq!(event.key, None);
    }
}
