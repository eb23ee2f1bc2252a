//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Available products, all categories
//! GET  /{category_slug}           - Available products in one category
//! GET  /{id}/{slug}               - Product detail with add-to-cart form
//!
//! # Cart
//! GET  /cart                      - Cart page
//! POST /cart/add/{product_id}     - Add or set quantity, redirects to /cart
//! POST /cart/remove/{product_id}  - Remove line, redirects to /cart
//!
//! # Map
//! GET  /mapa                      - Map at the store location
//! POST /mapa                      - Map at submitted coordinates
//! ```
//!
//! Trailing slashes are trimmed before routing, so `/cart/` and `/cart` are
//! the same page.

pub mod cart;
pub mod map;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add/{product_id}", post(cart::add))
        .route("/remove/{product_id}", post(cart::remove))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/mapa", get(map::show).post(map::locate))
        .nest("/cart", cart_routes())
        .route("/{category_slug}", get(products::by_category))
        .route("/{id}/{slug}", get(products::show))
}
