//! Application state shared with the embedding UI.
//!
//! Replaces scattered root-level globals with one explicit object with a
//! defined lifecycle: built at startup from configuration, mounted with
//! [`AppState::start`], updated by well-named actions (sign-in/out, cart
//! and wishlist changes), and torn down with [`AppState::shutdown`].

use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

use crafty_spinx_core::{ItemId, UserId};

use crate::admin::AdminFacade;
use crate::config::{AppConfig, BackendConfig};
use crate::error::AppError;
use crate::session::Session;
use crate::store::{ItemStore, MemoryStore, RestStore};
use crate::sync::{SyncController, SyncPhase};
use crate::view::SharedView;

/// Application state.
///
/// Cheaply cloneable via `Arc`; clones share the store, the sync
/// controller, and the current session.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    store: Arc<dyn ItemStore>,
    sync: SyncController,
    admin: AdminFacade,
    session: RwLock<Option<Session>>,
}

impl AppState {
    /// Build state from configuration, constructing the configured store
    /// backend.
    ///
    /// # Errors
    ///
    /// Returns an error when the local snapshot cannot be loaded or the
    /// HTTP client cannot be constructed.
    pub fn new(config: AppConfig) -> Result<Self, AppError> {
        let store: Arc<dyn ItemStore> = match &config.backend {
            BackendConfig::Local {
                snapshot_path: Some(path),
            } => Arc::new(MemoryStore::with_snapshot(path.clone())?),
            BackendConfig::Local {
                snapshot_path: None,
            } => Arc::new(MemoryStore::new()),
            BackendConfig::Remote(remote) => Arc::new(RestStore::new(remote)?),
        };

        Ok(Self::with_store(config, store))
    }

    /// Build state around an existing store (tests, embedders with custom
    /// backends).
    #[must_use]
    pub fn with_store(config: AppConfig, store: Arc<dyn ItemStore>) -> Self {
        let sync = SyncController::new(Arc::clone(&store));
        let admin = AdminFacade::new(Arc::clone(&store), sync.view());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                sync,
                admin,
                session: RwLock::new(None),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Handle to the view the sync controller maintains.
    #[must_use]
    pub fn view(&self) -> SharedView {
        self.inner.sync.view()
    }

    #[must_use]
    pub fn sync_phase(&self) -> SyncPhase {
        self.inner.sync.phase()
    }

    /// The restricted catalog-editing surface.
    #[must_use]
    pub fn admin(&self) -> &AdminFacade {
        &self.inner.admin
    }

    /// The current session, if signed in.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.inner
            .session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Mount: bulk fetch and subscribe under the current identity.
    pub async fn start(&self) {
        let identity = self.session().map(|session| session.user_id);
        self.inner.sync.start(identity).await;
    }

    /// Sign-in action: store the session and re-sync under the new
    /// identity (the previous subscription is cancelled first).
    pub async fn sign_in(&self, session: Session) {
        info!(user = %session.user_id, role = %session.role, "signed in");
        let user = session.user_id;
        *self.write_session() = Some(session);
        self.inner.sync.set_identity(Some(user)).await;
    }

    /// Sign-out action: drop the session and re-sync anonymously.
    pub async fn sign_out(&self) {
        if self.write_session().take().is_some() {
            info!("signed out");
        }
        self.inner.sync.set_identity(None).await;
    }

    /// Teardown: close the change feed.
    pub fn shutdown(&self) {
        self.inner.sync.shutdown();
    }

    // =========================================================================
    // Shopper actions
    // =========================================================================

    /// Add an item to the signed-in user's cart. Duplicates are rejected
    /// and leave the cart untouched; returns whether the entry was added.
    ///
    /// # Errors
    ///
    /// [`AppError::NotSignedIn`] without a session, or the store's
    /// failure (notably `NotFound` for a vanished item).
    pub async fn add_to_cart(&self, item: ItemId) -> Result<bool, AppError> {
        let user = self.require_user()?;
        let added = self.inner.store.add_to_cart(user, item).await?;
        if added {
            self.view().write(|view| {
                view.add_cart_entry(item);
            });
        }
        Ok(added)
    }

    /// Remove a cart entry.
    ///
    /// # Errors
    ///
    /// [`AppError::NotSignedIn`] without a session, or the store's
    /// failure.
    pub async fn remove_from_cart(&self, item: ItemId) -> Result<(), AppError> {
        let user = self.require_user()?;
        self.inner.store.remove_from_cart(user, item).await?;
        self.view().write(|view| view.remove_cart_entry(item));
        Ok(())
    }

    /// Flip wishlist membership for an item; returns the resulting
    /// membership.
    ///
    /// # Errors
    ///
    /// [`AppError::NotSignedIn`] without a session, or the store's
    /// failure.
    pub async fn toggle_wishlist(&self, item: ItemId) -> Result<bool, AppError> {
        let user = self.require_user()?;
        let wishlisted = self.inner.store.toggle_wishlist(user, item).await?;
        self.view()
            .write(|view| view.set_wishlisted(item, wishlisted));
        Ok(wishlisted)
    }

    /// Submit the inquiry for the current cart; on success the cart is
    /// cleared remotely and locally.
    ///
    /// # Errors
    ///
    /// [`AppError::NotSignedIn`] without a session, or the store's
    /// failure (in which case the cart is left as it was).
    pub async fn submit_inquiry(&self) -> Result<(), AppError> {
        let user = self.require_user()?;
        self.inner.store.clear_cart(user).await?;
        self.view().write(crate::view::ViewState::clear_cart);
        info!("inquiry submitted; cart cleared");
        Ok(())
    }

    fn require_user(&self) -> Result<UserId, AppError> {
        self.session()
            .map(|session| session.user_id)
            .ok_or(AppError::NotSignedIn)
    }

    fn write_session(&self) -> std::sync::RwLockWriteGuard<'_, Option<Session>> {
        self.inner
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
