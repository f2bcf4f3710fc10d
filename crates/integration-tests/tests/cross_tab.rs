//! Integration tests for tabs of one origin sharing a cart.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use brume_core::{Cart, VariantKey};
use brume_integration_tests::Tab;
use brume_storefront::cart::views::{classes, ids};
use brume_storefront::storage::{KeyValueStorage, MemoryOrigin};

#[test]
fn test_other_tab_badge_follows_without_mutating() {
    let origin = MemoryOrigin::new();
    let tab_a = Tab::open(&origin);
    let mut tab_b = Tab::open(&origin);

    tab_a.page.click("add-to-cart", None);
    assert_eq!(tab_b.badge_text(), "0");

    assert_eq!(tab_b.sync(), 1);
    assert_eq!(tab_b.badge_text(), "1");
    assert!(tab_b.surface.has_class(ids::BADGE, classes::HAS_ITEMS));
    assert!(
        tab_b
            .surface
            .inner_html(ids::DRAWER_BODY)
            .unwrap()
            .contains("data-color=\"silver\"")
    );
    // Tab B only re-rendered; the drawer stays closed.
    assert!(!tab_b.page.drawer().is_open());
}

#[test]
fn test_own_writes_are_not_echoed() {
    let origin = MemoryOrigin::new();
    let mut tab = Tab::open(&origin);
    tab.page.click("add-to-cart", None);
    assert_eq!(tab.sync(), 0);
}

#[test]
fn test_mutation_before_event_keeps_other_tab_write() {
    let origin = MemoryOrigin::new();
    let mut tab_a = Tab::open(&origin);
    let mut tab_b = Tab::open(&origin);

    tab_a.page.store().add_item(&VariantKey::new("silver"));
    // B mutates before it has handled A's change event.
    tab_b.page.store().add_item(&VariantKey::new("white"));

    let raw = origin.context().get_item("brume_cart").unwrap().unwrap();
    let stored = Cart::from_json(&raw).unwrap();
    assert_eq!(stored.count(), 2);

    tab_a.sync();
    tab_b.sync();
    for tab in [&tab_a, &tab_b] {
        assert_eq!(tab.page.store().items(), stored);
        assert_eq!(tab.badge_text(), "2");
    }
}

#[test]
fn test_reads_match_storage_at_every_step() {
    let origin = MemoryOrigin::new();
    let tab_a = Tab::open(&origin);
    let tab_b = Tab::open(&origin);
    let stored = || {
        origin
            .context()
            .get_item("brume_cart")
            .unwrap()
            .map_or_else(Cart::new, |raw| Cart::from_json(&raw).unwrap())
    };

    tab_a.page.click("add-to-cart", None);
    assert_eq!(tab_b.page.store().items(), stored());
    tab_b.page.click("increment", Some("silver"));
    assert_eq!(tab_a.page.store().items(), stored());
    assert_eq!(tab_a.page.store().quantity_of(&VariantKey::new("silver")), Some(2));
    tab_a.page.click("remove", Some("silver"));
    assert_eq!(tab_b.page.store().items(), stored());
    assert_eq!(tab_b.page.store().count(), 0);
}

#[test]
fn test_unrelated_keys_are_ignored() {
    let origin = MemoryOrigin::new();
    let mut tab = Tab::open(&origin);

    origin.context().set_item("newsletter_seen", "1").unwrap();
    assert_eq!(tab.sync(), 0);
    assert_eq!(tab.badge_text(), "0");
}

#[test]
fn test_clearing_storage_empties_other_tabs() {
    let origin = MemoryOrigin::new();
    let tab_a = Tab::open(&origin);
    let mut tab_b = Tab::open(&origin);
    tab_a.page.click("add-to-cart", None);
    tab_b.sync();

    origin.context().remove_item("brume_cart").unwrap();
    tab_b.sync();

    assert_eq!(tab_b.page.store().count(), 0);
    assert_eq!(tab_b.badge_text(), "0");
}

#[tokio::test]
async fn test_listener_updates_badge() {
    let origin = MemoryOrigin::new();
    let tab_a = Tab::open(&origin);
    let mut tab_b = Tab::open(&origin);
    tab_b.page.listen(tab_b.changes.take().unwrap());

    tab_a.page.store().add_item(&VariantKey::new("silver"));

    tokio::time::timeout(Duration::from_secs(1), async {
        while tab_b.badge_text() != "1" {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();
    assert_eq!(tab_b.page.store().count(), 1);
}
