//! Sync controller for the watched item collection.
//!
//! Orchestrates the fetch-on-mount / re-fetch-on-identity-change /
//! subscribe lifecycle and reconciles incoming change events into the
//! shared view. At most one subscription is open per controller: starting
//! (or re-starting) cancels the previous drain task, which drops and
//! thereby closes its feed, before a new one is opened.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crafty_spinx_core::UserId;

use crate::catalog;
use crate::store::ItemStore;
use crate::view::SharedView;

/// Where the controller is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPhase {
    /// No fetch issued and no feed open.
    #[default]
    Idle,
    /// Bulk fetch in flight.
    Fetching,
    /// Bulk data loaded and the change feed is draining.
    Subscribed,
    /// The bulk fetch failed and the built-in default catalog was loaded
    /// instead. Sticky for the mount even once the feed opens, so the UI
    /// can tell it is showing fallback data.
    FallbackLoaded,
}

/// Keeps the shared view current against the item store.
pub struct SyncController {
    store: Arc<dyn ItemStore>,
    view: SharedView,
    phase: Arc<RwLock<SyncPhase>>,
    drain: Mutex<Option<JoinHandle<()>>>,
}

impl SyncController {
    #[must_use]
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        Self {
            store,
            view: SharedView::new(),
            phase: Arc::new(RwLock::new(SyncPhase::Idle)),
            drain: Mutex::new(None),
        }
    }

    /// Handle to the view this controller maintains.
    #[must_use]
    pub fn view(&self) -> SharedView {
        self.view.clone()
    }

    #[must_use]
    pub fn phase(&self) -> SyncPhase {
        *self.phase.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mount, or re-mount after an identity change.
    ///
    /// Cancels any previous subscription, bulk-fetches the catalog
    /// (falling back to the built-in default catalog when the store is
    /// unreachable - the catalog is never left empty), loads the
    /// identity's cart and wishlist, then opens a fresh change feed.
    pub async fn start(&self, identity: Option<UserId>) {
        self.cancel_drain();
        self.set_phase(SyncPhase::Fetching);

        let fallback = match self.store.list_items().await {
            Ok(items) => {
                self.view.write(|view| view.replace_items(items));
                false
            }
            Err(err) => {
                warn!(error = %err, "catalog fetch failed; loading built-in defaults");
                self.view
                    .write(|view| view.replace_items(catalog::default_catalog()));
                self.set_phase(SyncPhase::FallbackLoaded);
                true
            }
        };

        self.load_associations(identity).await;

        // Subscriptions are independent of the fetch outcome: a fallback
        // catalog still reconciles live events if the feed comes up.
        let mut feed = self.store.subscribe();
        if !fallback {
            self.set_phase(SyncPhase::Subscribed);
        }

        let view = self.view.clone();
        let phase = Arc::clone(&self.phase);
        let handle = tokio::spawn(async move {
            while let Some(event) = feed.recv().await {
                debug!(kind = ?event.kind, item = %event.item.id, "reconciling change event");
                view.write(|view| view.apply(&event));
            }
            // The feed is finite; ending it returns the controller to
            // idle until someone re-subscribes via start().
            debug!("item feed ended");
            *phase.write().unwrap_or_else(PoisonError::into_inner) = SyncPhase::Idle;
        });

        *self
            .drain
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handle);
    }

    /// Switch the watched identity: same lifecycle as a fresh mount, with
    /// the previous subscription cancelled first.
    pub async fn set_identity(&self, identity: Option<UserId>) {
        self.start(identity).await;
    }

    /// Teardown: close the feed and return to idle.
    pub fn shutdown(&self) {
        self.cancel_drain();
        self.set_phase(SyncPhase::Idle);
    }

    async fn load_associations(&self, identity: Option<UserId>) {
        let Some(user) = identity else {
            self.view.write(|view| {
                view.set_cart(Vec::new());
                view.set_wishlist(Vec::new());
            });
            return;
        };

        let cart = self.store.cart(user).await.unwrap_or_else(|err| {
            warn!(error = %err, "cart fetch failed; starting empty");
            Vec::new()
        });
        let wishlist = self.store.wishlist(user).await.unwrap_or_else(|err| {
            warn!(error = %err, "wishlist fetch failed; starting empty");
            Vec::new()
        });

        self.view.write(|view| {
            view.set_cart(cart);
            view.set_wishlist(wishlist);
        });
    }

    fn cancel_drain(&self) {
        if let Some(handle) = self
            .drain
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            // Aborting drops the feed inside the task, which releases the
            // subscription before a new one is opened.
            handle.abort();
        }
    }

    fn set_phase(&self, phase: SyncPhase) {
        *self.phase.write().unwrap_or_else(PoisonError::into_inner) = phase;
    }
}

impl Drop for SyncController {
    fn drop(&mut self) {
        self.cancel_drain();
    }
}
