//! Crafty Spinx Core - Shared domain types.
//!
//! This crate provides the common types used across the Crafty Spinx
//! workspace:
//! - `storefront` - The catalog synchronization client a UI embeds
//! - `integration-tests` - End-to-end scenario tests
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no async.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, emails, catalog items, and change events

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
