//! Item store clients.
//!
//! # Architecture
//!
//! The authoritative item collection and the per-user cart/wishlist
//! association tables live behind the [`ItemStore`] contract. Two backends
//! implement it:
//!
//! - [`MemoryStore`] - on-device storage (optionally mirrored to a JSON
//!   snapshot file); also the test backend
//! - [`RestStore`] - a hosted backend over HTTP
//!
//! Backends are interchangeable behind `Arc<dyn ItemStore>`. Change
//! delivery is a subscription: [`ItemStore::subscribe`] returns an
//! [`ItemFeed`], a finite stream of [`ItemEvent`]s that ends when the
//! subscription is lost and is restarted by subscribing again.

mod memory;
mod rest;

pub use memory::MemoryStore;
pub use rest::RestStore;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crafty_spinx_core::{Item, ItemDraft, ItemEvent, ItemId, ItemPatch, UserId};

/// Errors returned by item store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached or answered abnormally.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The target identity does not exist.
    #[error("item {0} not found")]
    NotFound(ItemId),

    /// The input was rejected before reaching the collection.
    #[error("invalid item: {0}")]
    Validation(String),

    /// A catalog replace deleted the old collection but could not finish
    /// inserting the new one. The collection is left in the partial state;
    /// callers must surface this distinctly so an operator knows manual
    /// recovery is needed.
    #[error("catalog replace incomplete: {inserted} of {expected} items restored")]
    ReplaceIncomplete {
        inserted: usize,
        expected: usize,
        #[source]
        source: Box<StoreError>,
    },
}

/// Client contract for the authoritative item collection and the per-user
/// cart/wishlist association tables.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Fetch the full ordered item collection.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] when the backend cannot be
    /// reached; the sync controller then falls back to the built-in
    /// default catalog rather than leaving the catalog empty.
    async fn list_items(&self) -> Result<Vec<Item>, StoreError>;

    /// Insert a new item. The result carries a freshly assigned identity
    /// that collides with no existing one.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] when required fields are
    /// missing, [`StoreError::Unavailable`] on transport failure.
    async fn insert_item(&self, draft: ItemDraft) -> Result<Item, StoreError>;

    /// Patch an existing item.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the identity does not exist.
    async fn update_item(&self, id: ItemId, patch: ItemPatch) -> Result<Item, StoreError>;

    /// Delete an item. Idempotent: deleting an absent identity is not an
    /// error. Cart and wishlist entries referencing the item are dropped
    /// with it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] on transport failure.
    async fn delete_item(&self, id: ItemId) -> Result<(), StoreError>;

    /// Replace the whole collection: delete everything, then insert the
    /// given drafts.
    ///
    /// The two steps are not atomic. When the delete step has run but an
    /// insert fails, the error is [`StoreError::ReplaceIncomplete`] so the
    /// caller can report that the collection was left empty or partially
    /// restored rather than silently retry.
    ///
    /// # Errors
    ///
    /// Any [`StoreError`]; failures after the delete step are wrapped in
    /// [`StoreError::ReplaceIncomplete`].
    async fn replace_all(&self, drafts: Vec<ItemDraft>) -> Result<Vec<Item>, StoreError> {
        let existing = self.list_items().await?;
        for item in existing {
            self.delete_item(item.id).await?;
        }

        let expected = drafts.len();
        let mut inserted = Vec::with_capacity(expected);
        for draft in drafts {
            match self.insert_item(draft).await {
                Ok(item) => inserted.push(item),
                Err(err) => {
                    return Err(StoreError::ReplaceIncomplete {
                        inserted: inserted.len(),
                        expected,
                        source: Box::new(err),
                    });
                }
            }
        }

        Ok(inserted)
    }

    /// Open a change feed for the item collection.
    ///
    /// Events arrive in the order the backend emitted them; no ordering is
    /// guaranteed across kinds beyond arrival order. Dropping the feed
    /// releases the subscription, so a caller that re-subscribes without
    /// holding the old feed cannot see duplicate delivery.
    fn subscribe(&self) -> ItemFeed;

    /// Item identities in the user's cart, in insertion order.
    async fn cart(&self, user: UserId) -> Result<Vec<ItemId>, StoreError>;

    /// Add an item to the user's cart. Returns `false` when the entry
    /// already exists: duplicates are rejected, not merged.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the item does not exist.
    async fn add_to_cart(&self, user: UserId, item: ItemId) -> Result<bool, StoreError>;

    /// Remove a cart entry. Removing an absent entry is not an error.
    async fn remove_from_cart(&self, user: UserId, item: ItemId) -> Result<(), StoreError>;

    /// Drop every cart entry for the user (inquiry submitted).
    async fn clear_cart(&self, user: UserId) -> Result<(), StoreError>;

    /// Item identities in the user's wishlist.
    async fn wishlist(&self, user: UserId) -> Result<Vec<ItemId>, StoreError>;

    /// Flip wishlist membership for the item and return the resulting
    /// membership.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the item does not exist.
    async fn toggle_wishlist(&self, user: UserId, item: ItemId) -> Result<bool, StoreError>;
}

/// A stream of [`ItemEvent`]s from one [`ItemStore::subscribe`] call.
///
/// Finite: [`ItemFeed::recv`] returns `None` once the subscription has
/// ended. Restart by subscribing again.
pub struct ItemFeed {
    inner: FeedInner,
}

enum FeedInner {
    /// Fan-out from an in-process store.
    Broadcast(broadcast::Receiver<ItemEvent>),
    /// Pumped by a background task (remote stores).
    Channel {
        rx: mpsc::Receiver<ItemEvent>,
        pump: JoinHandle<()>,
    },
}

impl ItemFeed {
    pub(crate) fn from_broadcast(rx: broadcast::Receiver<ItemEvent>) -> Self {
        Self {
            inner: FeedInner::Broadcast(rx),
        }
    }

    pub(crate) fn from_channel(rx: mpsc::Receiver<ItemEvent>, pump: JoinHandle<()>) -> Self {
        Self {
            inner: FeedInner::Channel { rx, pump },
        }
    }

    /// Receive the next event, or `None` once the feed has ended.
    ///
    /// A subscriber that falls too far behind an in-process store loses
    /// the oldest events; the loss is logged and delivery continues.
    pub async fn recv(&mut self) -> Option<ItemEvent> {
        match &mut self.inner {
            FeedInner::Broadcast(rx) => loop {
                match rx.recv().await {
                    Ok(event) => return Some(event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "item feed lagged; oldest events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            },
            FeedInner::Channel { rx, .. } => rx.recv().await,
        }
    }
}

impl Drop for ItemFeed {
    fn drop(&mut self) {
        if let FeedInner::Channel { pump, .. } = &self.inner {
            pump.abort();
        }
    }
}

impl std::fmt::Debug for ItemFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.inner {
            FeedInner::Broadcast(_) => "broadcast",
            FeedInner::Channel { .. } => "channel",
        };
        f.debug_struct("ItemFeed").field("kind", &kind).finish()
    }
}
