//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `cart` - Bridges the visitor's session to the core cart model and
//!   enriches cart lines from the catalog

pub mod cart;

pub use cart::{CartSession, ProductLookup, cart_items};
