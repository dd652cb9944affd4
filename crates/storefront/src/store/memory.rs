//! In-memory item store with optional JSON snapshot persistence.
//!
//! The "local device storage" backend: state lives in process, identities
//! are assigned locally, and an optional snapshot file mirrors the item
//! collection across restarts. Also the backend the test suites run
//! against.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::warn;

use crafty_spinx_core::{Item, ItemDraft, ItemEvent, ItemId, ItemPatch, UserId};

use super::{ItemFeed, ItemStore, StoreError};

/// Capacity of the change fan-out buffer. A subscriber lagging past this
/// loses the oldest events (logged by the feed).
const FEED_CAPACITY: usize = 256;

/// In-memory item store.
///
/// Cheaply cloneable; clones share the same tables and change feed.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<MemoryStoreInner>,
}

struct MemoryStoreInner {
    tables: Mutex<Tables>,
    events: broadcast::Sender<ItemEvent>,
    snapshot_path: Option<PathBuf>,
}

#[derive(Default)]
struct Tables {
    items: Vec<Item>,
    next_id: i64,
    carts: HashMap<UserId, Vec<ItemId>>,
    wishlists: HashMap<UserId, HashSet<ItemId>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_items(Vec::new())
    }

    /// Create a store seeded with the given items.
    #[must_use]
    pub fn with_items(items: Vec<Item>) -> Self {
        Self::build(items, None)
    }

    /// Open a store whose item collection is mirrored to a JSON snapshot
    /// file, loading the existing snapshot when present.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] when an existing snapshot
    /// cannot be read or is not a valid item list.
    pub fn with_snapshot(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let items = match std::fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str(&json).map_err(|err| {
                StoreError::Unavailable(format!(
                    "snapshot {} is not a valid item list: {err}",
                    path.display()
                ))
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(err) => {
                return Err(StoreError::Unavailable(format!(
                    "cannot read snapshot {}: {err}",
                    path.display()
                )));
            }
        };

        Ok(Self::build(items, Some(path)))
    }

    fn build(items: Vec<Item>, snapshot_path: Option<PathBuf>) -> Self {
        let next_id = items.iter().map(|i| i.id.as_i64()).max().unwrap_or(0) + 1;
        let (events, _) = broadcast::channel(FEED_CAPACITY);

        Self {
            inner: Arc::new(MemoryStoreInner {
                tables: Mutex::new(Tables {
                    items,
                    next_id,
                    carts: HashMap::new(),
                    wishlists: HashMap::new(),
                }),
                events,
                snapshot_path,
            }),
        }
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.inner
            .tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Mirror the item collection to the snapshot file, if configured.
    /// A write failure keeps the in-memory state authoritative.
    fn persist(&self, tables: &Tables) {
        let Some(path) = &self.inner.snapshot_path else {
            return;
        };

        match serde_json::to_string_pretty(&tables.items) {
            Ok(json) => {
                if let Err(err) = std::fs::write(path, json) {
                    warn!(path = %path.display(), error = %err, "could not write catalog snapshot");
                }
            }
            Err(err) => warn!(error = %err, "could not serialize catalog snapshot"),
        }
    }

    fn emit(&self, event: ItemEvent) {
        // No subscribers is fine; events before the first subscribe are
        // absorbed by the next bulk fetch.
        let _ = self.inner.events.send(event);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn check_draft(draft: &ItemDraft) -> Result<(), StoreError> {
    if draft.name.trim().is_empty() {
        return Err(StoreError::Validation("name cannot be empty".to_string()));
    }
    if draft.price.is_negative() {
        return Err(StoreError::Validation(
            "price must not be negative".to_string(),
        ));
    }
    Ok(())
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn list_items(&self) -> Result<Vec<Item>, StoreError> {
        Ok(self.tables().items.clone())
    }

    async fn insert_item(&self, draft: ItemDraft) -> Result<Item, StoreError> {
        check_draft(&draft)?;

        let item = {
            let mut tables = self.tables();
            let id = ItemId::new(tables.next_id);
            tables.next_id += 1;
            let item = draft.into_item(id);
            tables.items.push(item.clone());
            self.persist(&tables);
            item
        };

        self.emit(ItemEvent::insert(item.clone()));
        Ok(item)
    }

    async fn update_item(&self, id: ItemId, patch: ItemPatch) -> Result<Item, StoreError> {
        let item = {
            let mut tables = self.tables();
            let item = tables
                .items
                .iter_mut()
                .find(|i| i.id == id)
                .ok_or(StoreError::NotFound(id))?;
            item.apply_patch(&patch);
            let item = item.clone();
            self.persist(&tables);
            item
        };

        self.emit(ItemEvent::update(item.clone()));
        Ok(item)
    }

    async fn delete_item(&self, id: ItemId) -> Result<(), StoreError> {
        let removed = {
            let mut tables = self.tables();
            let Some(position) = tables.items.iter().position(|i| i.id == id) else {
                return Ok(()); // idempotent
            };
            let removed = tables.items.remove(position);

            // Drop association rows referencing the item
            for cart in tables.carts.values_mut() {
                cart.retain(|&entry| entry != id);
            }
            for wishlist in tables.wishlists.values_mut() {
                wishlist.remove(&id);
            }

            self.persist(&tables);
            removed
        };

        self.emit(ItemEvent::delete(removed));
        Ok(())
    }

    fn subscribe(&self) -> ItemFeed {
        ItemFeed::from_broadcast(self.inner.events.subscribe())
    }

    async fn cart(&self, user: UserId) -> Result<Vec<ItemId>, StoreError> {
        Ok(self.tables().carts.get(&user).cloned().unwrap_or_default())
    }

    async fn add_to_cart(&self, user: UserId, item: ItemId) -> Result<bool, StoreError> {
        let mut tables = self.tables();
        if !tables.items.iter().any(|i| i.id == item) {
            return Err(StoreError::NotFound(item));
        }

        let cart = tables.carts.entry(user).or_default();
        if cart.contains(&item) {
            return Ok(false); // duplicates are rejected, not merged
        }
        cart.push(item);
        Ok(true)
    }

    async fn remove_from_cart(&self, user: UserId, item: ItemId) -> Result<(), StoreError> {
        if let Some(cart) = self.tables().carts.get_mut(&user) {
            cart.retain(|&entry| entry != item);
        }
        Ok(())
    }

    async fn clear_cart(&self, user: UserId) -> Result<(), StoreError> {
        self.tables().carts.remove(&user);
        Ok(())
    }

    async fn wishlist(&self, user: UserId) -> Result<Vec<ItemId>, StoreError> {
        let mut ids: Vec<ItemId> = self
            .tables()
            .wishlists
            .get(&user)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn toggle_wishlist(&self, user: UserId, item: ItemId) -> Result<bool, StoreError> {
        let mut tables = self.tables();
        if !tables.items.iter().any(|i| i.id == item) {
            return Err(StoreError::NotFound(item));
        }

        let wishlist = tables.wishlists.entry(user).or_default();
        if wishlist.remove(&item) {
            Ok(false)
        } else {
            wishlist.insert(item);
            Ok(true)
        }
    }
}
