//! Myshop storefront library.
//!
//! Catalog pages, the session cart and the store map, served by the
//! `myshop-storefront` binary. Exposed as a library so the CLI can share the
//! repository and migrations, and so handlers can be unit tested.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
