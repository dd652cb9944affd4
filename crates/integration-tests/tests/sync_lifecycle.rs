//! Scenario tests for the sync controller lifecycle: mount, identity
//! change, fetch fallback, and change-event reconciliation.

use std::sync::Arc;
use std::time::Duration;

use crafty_spinx_core::{ItemId, ItemPatch};
use crafty_spinx_integration_tests::{
    FlakyStore, TestContext, draft, item, shopper_session, wait_until,
};
use crafty_spinx_storefront::config::AppConfig;
use crafty_spinx_storefront::state::AppState;
use crafty_spinx_storefront::store::{ItemStore, MemoryStore};
use crafty_spinx_storefront::sync::SyncPhase;

// =============================================================================
// Mount
// =============================================================================

#[tokio::test]
async fn test_mount_populates_view_from_store() {
    let ctx = TestContext::mounted(vec![item(1, "a", 100), item(2, "b", 200)]).await;

    assert_eq!(ctx.state.sync_phase(), SyncPhase::Subscribed);
    let names: Vec<String> = ctx
        .state
        .view()
        .read(|v| v.items().iter().map(|i| i.name.clone()).collect());
    assert_eq!(names, vec!["a", "b"]);
}

#[tokio::test]
async fn test_remote_changes_reconcile_into_view() {
    let ctx = TestContext::mounted(vec![item(1, "a", 100)]).await;
    let view = ctx.state.view();

    // Insert behind the controller's back
    let inserted = ctx.store.insert_item(draft("b", 200)).await.unwrap();
    assert!(wait_until(|| view.read(|v| v.item(inserted.id).is_some())).await);

    // Update
    ctx.store
        .update_item(
            inserted.id,
            ItemPatch {
                name: Some("b2".to_string()),
                ..ItemPatch::default()
            },
        )
        .await
        .unwrap();
    assert!(
        wait_until(|| view.read(|v| v.item(inserted.id).is_some_and(|i| i.name == "b2"))).await
    );

    // Delete
    ctx.store.delete_item(inserted.id).await.unwrap();
    assert!(wait_until(|| view.read(|v| v.item(inserted.id).is_none())).await);
    // The seeded item is untouched
    assert!(view.read(|v| v.item(ItemId::new(1)).is_some()));
}

// =============================================================================
// Fetch failure fallback
// =============================================================================

#[tokio::test]
async fn test_fetch_failure_loads_default_catalog() {
    let flaky = Arc::new(FlakyStore::new(MemoryStore::new()));
    flaky.fail_list(true);
    let store: Arc<dyn ItemStore> = flaky.clone();
    let state = AppState::with_store(AppConfig::local(), store);

    state.start().await;

    // The catalog is never left empty
    assert_eq!(state.sync_phase(), SyncPhase::FallbackLoaded);
    let view = state.view();
    assert_eq!(view.read(|v| v.items().len()), 16);
    assert!(view.read(|v| v.items().iter().any(|i| i.name == "Barnaby the Bear")));

    // The subscription is independent of the failed fetch: live events
    // still reconcile onto the fallback data.
    let added = flaky.insert_item(draft("fresh stock", 10)).await.unwrap();
    assert!(
        wait_until(|| view.read(|v| v.item(added.id).is_some_and(|i| i.name == "fresh stock")))
            .await
    );

    // Sticky for the mount so the UI can tell it is showing fallback data
    assert_eq!(state.sync_phase(), SyncPhase::FallbackLoaded);
}

// =============================================================================
// Identity change & teardown
// =============================================================================

#[tokio::test]
async fn test_identity_change_keeps_one_live_subscription() {
    let ctx = TestContext::mounted(vec![item(1, "a", 100)]).await;

    // Re-mount twice under new identities; each start cancels the
    // previous feed before opening its own.
    ctx.state.sign_in(shopper_session()).await;
    ctx.state.sign_in(shopper_session()).await;
    assert_eq!(ctx.state.sync_phase(), SyncPhase::Subscribed);

    let added = ctx.store.insert_item(draft("b", 200)).await.unwrap();
    let view = ctx.state.view();
    assert!(wait_until(|| view.read(|v| v.item(added.id).is_some())).await);

    let copies = view.read(|v| v.items().iter().filter(|i| i.id == added.id).count());
    assert_eq!(copies, 1);
}

#[tokio::test]
async fn test_sign_in_loads_cart_and_wishlist() {
    let session = shopper_session();
    let user = session.user_id;
    let ctx = TestContext::new(vec![item(1, "a", 100), item(2, "b", 200)]);

    // Rows created before this device signs in
    ctx.store.add_to_cart(user, ItemId::new(1)).await.unwrap();
    ctx.store
        .toggle_wishlist(user, ItemId::new(2))
        .await
        .unwrap();

    ctx.state.start().await;
    assert_eq!(ctx.state.view().read(|v| v.cart_count()), 0);

    ctx.state.sign_in(session).await;
    let view = ctx.state.view();
    assert!(view.read(|v| v.is_in_cart(ItemId::new(1))));
    assert!(view.read(|v| v.is_wishlisted(ItemId::new(2))));

    // Signing out hides the per-user rows again
    ctx.state.sign_out().await;
    assert_eq!(ctx.state.view().read(|v| v.cart_count()), 0);
}

#[tokio::test]
async fn test_shutdown_stops_reconciliation() {
    let ctx = TestContext::mounted(vec![item(1, "a", 100)]).await;

    ctx.state.shutdown();
    assert_eq!(ctx.state.sync_phase(), SyncPhase::Idle);

    let added = ctx.store.insert_item(draft("b", 200)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(ctx.state.view().read(|v| v.item(added.id).is_none()));
}
