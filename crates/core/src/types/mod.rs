//! Core types for Crafty Spinx.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod event;
pub mod id;
pub mod item;
pub mod price;

pub use email::{Email, EmailError};
pub use event::{ChangeKind, ItemEvent};
pub use id::*;
pub use item::{Category, Item, ItemDraft, ItemPatch};
pub use price::{CurrencyCode, Price};
