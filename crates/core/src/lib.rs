//! Myshop Core - Shared types and the cart model.
//!
//! Used by:
//! - `storefront` - Public-facing shop (cart, catalog ids, prices, map)
//! - `cli` - Command-line tools, through the storefront's repository
//!
//! # Architecture
//!
//! The core crate contains only types, traits and in-memory logic - no I/O,
//! no database access, no HTTP. Session persistence and catalog lookups are
//! reached through traits that the storefront implements.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, prices and map coordinates
//! - [`cart`] - Session-backed shopping cart

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{Cart, CartLine, CatalogItem, EnrichedLine, MemorySession, SessionStore};
pub use types::*;
