//! Crafty Spinx Storefront - catalog synchronization client.
//!
//! The synchronization slice between a storefront UI and the authoritative
//! item store. A UI embeds [`AppState`], mounts it with
//! [`AppState::start`], and renders from the shared [`view::SharedView`];
//! the sync controller keeps that view current from the store's change
//! feed.
//!
//! # Architecture
//!
//! - [`store`] - Item store clients: the [`store::ItemStore`] contract,
//!   the on-device [`store::MemoryStore`], and the hosted
//!   [`store::RestStore`]
//! - [`sync`] - Fetch-on-mount, subscription lifecycle, reconciliation
//! - [`view`] - The local, eventually-consistent reflection of the
//!   catalog, cart, and wishlist
//! - [`admin`] - The restricted catalog-editing surface
//! - [`session`] / [`state`] - Identity and the application-state object
//!
//! # Example
//!
//! ```rust,ignore
//! use crafty_spinx_storefront::{AppState, config::AppConfig};
//!
//! let state = AppState::new(AppConfig::from_env()?)?;
//! state.start().await;
//!
//! let total = state.view().read(|v| v.cart_total());
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod admin;
pub mod catalog;
pub mod config;
pub mod error;
pub mod session;
pub mod state;
pub mod store;
pub mod sync;
pub mod telemetry;
pub mod view;

pub use error::AppError;
pub use state::AppState;
