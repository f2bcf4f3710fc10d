//! Integration tests for the cart store over real storage backends.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use brume_core::{Cart, Catalog, VariantKey};
use brume_storefront::cart::CartStore;
use brume_storefront::config::CartConfig;
use brume_storefront::error::RenderError;
use brume_storefront::storage::{FileStorage, KeyValueStorage, MemoryOrigin};
use rust_decimal::Decimal;

fn key(s: &str) -> VariantKey {
    VariantKey::new(s)
}

fn memory_store() -> (MemoryOrigin, CartStore) {
    let origin = MemoryOrigin::new();
    let store = CartStore::new(Arc::new(origin.context()), "brume_cart", Catalog::brume());
    (origin, store)
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_empty_store_reads() {
    let (_origin, store) = memory_store();
    assert!(store.items().is_empty());
    assert_eq!(store.count(), 0);
    assert_eq!(store.total(), Decimal::ZERO);
}

#[test]
fn test_add_silver_silver_white() {
    let (_origin, store) = memory_store();
    store.add_item(&key("silver"));
    store.add_item(&key("silver"));
    store.add_item(&key("white"));

    let items = store.items();
    let lines: Vec<_> = items.iter().map(|i| (i.id.as_str(), i.quantity)).collect();
    assert_eq!(lines, [("silver", 2), ("white", 1)]);
    assert_eq!(store.count(), 3);
    assert_eq!(store.total(), Decimal::new(118_500, 2));
}

#[test]
fn test_repeated_adds_make_one_line() {
    let (_origin, store) = memory_store();
    for n in 1..=7 {
        store.add_item(&key("white"));
        assert_eq!(store.count(), n);
    }
    assert_eq!(store.items().len(), 1);
}

#[test]
fn test_add_then_zero_restores_count() {
    let (_origin, store) = memory_store();
    store.add_item(&key("white"));
    let before = store.count();

    store.add_item(&key("silver"));
    store.set_quantity(&key("silver"), 0);

    assert_eq!(store.count(), before);
    assert_eq!(store.quantity_of(&key("silver")), None);
}

#[test]
fn test_total_follows_every_mutation() {
    let (_origin, store) = memory_store();
    store.add_item(&key("silver"));
    store.set_quantity(&key("silver"), 4);
    store.add_item(&key("white"));

    let expected: Decimal = store
        .items()
        .iter()
        .map(|i| i.unit_price * Decimal::from(i.quantity))
        .sum();
    assert_eq!(store.total(), expected);

    store.remove_item(&key("silver"));
    assert_eq!(store.total(), Decimal::new(39_500, 2));
}

#[test]
fn test_remove_twice_is_idempotent() {
    let (_origin, once) = memory_store();
    let (_other, twice) = memory_store();
    for store in [&once, &twice] {
        store.add_item(&key("silver"));
        store.add_item(&key("white"));
    }

    once.remove_item(&key("silver"));
    twice.remove_item(&key("silver"));
    twice.remove_item(&key("silver"));

    assert_eq!(once.items(), twice.items());
}

// =============================================================================
// Persistence
// =============================================================================

#[test]
fn test_persisted_layout() {
    let (origin, store) = memory_store();
    store.add_item(&key("silver"));

    let raw = origin.context().get_item("brume_cart").unwrap().unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(
        json,
        serde_json::json!([{
            "id": "silver",
            "name": "brume filter",
            "color": "Silver",
            "price": 395.0,
            "currency": "Dhs.",
            "quantity": 1
        }])
    );
}

#[test]
fn test_reload_yields_identical_items() {
    let (origin, store) = memory_store();
    store.add_item(&key("white"));
    store.add_item(&key("silver"));
    store.set_quantity(&key("white"), 3);

    let reopened = CartStore::new(Arc::new(origin.context()), "brume_cart", Catalog::brume());
    assert_eq!(reopened.items(), store.items());
}

#[test]
fn test_file_storage_survives_new_store() {
    let dir = tempfile::tempdir().unwrap();
    let config = CartConfig {
        storage_dir: Some(dir.path().to_path_buf()),
        ..CartConfig::default()
    };

    let store = CartStore::new(
        brume_storefront::storage::from_config(&config),
        config.storage_key.clone(),
        Catalog::brume(),
    );
    store.add_item(&key("silver"));
    store.add_item(&key("white"));
    drop(store);

    let reopened = CartStore::new(
        Arc::new(FileStorage::new(dir.path())),
        "brume_cart",
        Catalog::brume(),
    );
    assert_eq!(reopened.count(), 2);
    assert_eq!(reopened.items().get(&key("white")).unwrap().variant_label, "Pearl White");
}

#[test]
fn test_hand_edited_payload_is_normalized() {
    let origin = MemoryOrigin::new();
    origin
        .context()
        .set_item(
            "brume_cart",
            r#"[{"id":"silver","name":"brume filter","color":"Silver","price":395,"currency":"Dhs.","quantity":0},
                {"id":"white","name":"brume filter","color":"Pearl White","price":395,"currency":"Dhs.","quantity":2}]"#,
        )
        .unwrap();

    let store = CartStore::new(Arc::new(origin.context()), "brume_cart", Catalog::brume());
    assert_eq!(store.count(), 2);
    assert_eq!(store.items().len(), 1);
}

#[test]
fn test_garbage_payload_reads_empty() {
    let origin = MemoryOrigin::new();
    origin.context().set_item("brume_cart", "{not json").unwrap();

    let store = CartStore::new(Arc::new(origin.context()), "brume_cart", Catalog::brume());
    assert_eq!(store.items(), Cart::new());
}

#[test]
fn test_disabled_storage_keeps_session_state() {
    let (origin, store) = memory_store();
    origin.set_disabled(true);
    let hits = Arc::new(AtomicUsize::new(0));
    let h = Arc::clone(&hits);
    store.subscribe(move || {
        h.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    store.add_item(&key("silver"));

    assert_eq!(store.count(), 1);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Subscribers
// =============================================================================

#[test]
fn test_two_subscribers_each_called_once() {
    let (_origin, store) = memory_store();
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));

    let f = Arc::clone(&first);
    store.subscribe(move || {
        f.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    store.subscribe(|| Err(RenderError::Detached));
    let s = Arc::clone(&second);
    store.subscribe(move || {
        s.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    store.add_item(&key("silver"));

    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(second.load(Ordering::SeqCst), 1);
}
