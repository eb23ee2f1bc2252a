//! Domain models for the storefront.
//!
//! These types represent validated domain objects separate from database row
//! types (see `db::catalog` for the row mappings).

pub mod catalog;

pub use catalog::{Category, NewProduct, Product};
