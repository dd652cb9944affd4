//! Shared support for the Crafty Spinx scenario tests.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p crafty-spinx-integration-tests
//! ```
//!
//! Everything runs against the in-memory backend; no external services
//! are required.
//!
//! # Test Categories
//!
//! - `sync_lifecycle` - Mount, identity change, fallback, reconciliation
//! - `admin_catalog` - The admin mutation surface end to end
//! - `cart_wishlist` - Shopper actions and derived cart views

#![cfg_attr(not(test), forbid(unsafe_code))]
// Test support: panicking on bad fixtures is the right failure mode here.
#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crafty_spinx_core::{
    Category, Email, Item, ItemDraft, ItemId, ItemPatch, Price, UserId,
};
use crafty_spinx_storefront::config::AppConfig;
use crafty_spinx_storefront::session::{Role, Session};
use crafty_spinx_storefront::state::AppState;
use crafty_spinx_storefront::store::{ItemFeed, ItemStore, MemoryStore, StoreError};

/// App state wired to an in-memory backend, plus a direct store handle
/// for injecting "remote" changes behind the sync controller's back.
pub struct TestContext {
    pub state: AppState,
    pub store: MemoryStore,
}

impl TestContext {
    #[must_use]
    pub fn new(items: Vec<Item>) -> Self {
        let store = MemoryStore::with_items(items);
        let state = AppState::with_store(AppConfig::local(), Arc::new(store.clone()));
        Self { state, store }
    }

    /// Context that has already completed its mount (bulk fetch +
    /// subscribe, no identity).
    pub async fn mounted(items: Vec<Item>) -> Self {
        let ctx = Self::new(items);
        ctx.state.start().await;
        ctx
    }

    /// Context mounted under a signed-in session.
    pub async fn signed_in(items: Vec<Item>, session: Session) -> Self {
        let ctx = Self::new(items);
        ctx.state.start().await;
        ctx.state.sign_in(session).await;
        ctx
    }
}

/// Poll until `predicate` holds; returns `false` on timeout (2s).
pub async fn wait_until(predicate: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        if predicate() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[must_use]
pub fn admin_session() -> Session {
    Session::new(
        UserId::random(),
        Email::parse("admin@craftyspinx.shop").unwrap(),
        Role::Admin,
    )
}

#[must_use]
pub fn shopper_session() -> Session {
    Session::new(
        UserId::random(),
        Email::parse("shopper@craftyspinx.shop").unwrap(),
        Role::Shopper,
    )
}

/// A catalog item fixture priced in whole dollars.
#[must_use]
pub fn item(id: i64, name: &str, dollars: i64) -> Item {
    Item {
        id: ItemId::new(id),
        name: name.to_string(),
        description: format!("{name} description"),
        price: Price::usd(Decimal::new(dollars, 0)),
        image_url: "https://example.com/photo.jpg".to_string(),
        category: Category::Random,
        model_url: None,
    }
}

/// A draft fixture priced in whole dollars.
#[must_use]
pub fn draft(name: &str, dollars: i64) -> ItemDraft {
    item(0, name, dollars).into_draft()
}

/// Item-store double that forwards to a [`MemoryStore`] but can be told
/// to fail bulk fetches or inserts, for the transport-failure and
/// partial-replace scenarios.
///
/// `replace_all` deliberately keeps the default delete-then-insert flow
/// so injected insert failures exercise the real partial-replace path.
pub struct FlakyStore {
    inner: MemoryStore,
    fail_list: AtomicBool,
    fail_inserts: AtomicBool,
}

impl FlakyStore {
    #[must_use]
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            fail_list: AtomicBool::new(false),
            fail_inserts: AtomicBool::new(false),
        }
    }

    pub fn fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    fn unavailable(operation: &str) -> StoreError {
        StoreError::Unavailable(format!("injected {operation} failure"))
    }
}

#[async_trait]
impl ItemStore for FlakyStore {
    async fn list_items(&self) -> Result<Vec<Item>, StoreError> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(Self::unavailable("list"));
        }
        self.inner.list_items().await
    }

    async fn insert_item(&self, draft: ItemDraft) -> Result<Item, StoreError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(Self::unavailable("insert"));
        }
        self.inner.insert_item(draft).await
    }

    async fn update_item(&self, id: ItemId, patch: ItemPatch) -> Result<Item, StoreError> {
        self.inner.update_item(id, patch).await
    }

    async fn delete_item(&self, id: ItemId) -> Result<(), StoreError> {
        self.inner.delete_item(id).await
    }

    fn subscribe(&self) -> ItemFeed {
        self.inner.subscribe()
    }

    async fn cart(&self, user: UserId) -> Result<Vec<ItemId>, StoreError> {
        self.inner.cart(user).await
    }

    async fn add_to_cart(&self, user: UserId, item: ItemId) -> Result<bool, StoreError> {
        self.inner.add_to_cart(user, item).await
    }

    async fn remove_from_cart(&self, user: UserId, item: ItemId) -> Result<(), StoreError> {
        self.inner.remove_from_cart(user, item).await
    }

    async fn clear_cart(&self, user: UserId) -> Result<(), StoreError> {
        self.inner.clear_cart(user).await
    }

    async fn wishlist(&self, user: UserId) -> Result<Vec<ItemId>, StoreError> {
        self.inner.wishlist(user).await
    }

    async fn toggle_wishlist(&self, user: UserId, item: ItemId) -> Result<bool, StoreError> {
        self.inner.toggle_wishlist(user, item).await
    }
}
