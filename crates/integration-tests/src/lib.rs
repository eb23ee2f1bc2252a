//! Integration tests for Myshop.
//!
//! # Running Tests
//!
//! ```bash
//! # Migrate the database and start the storefront
//! cargo run -p myshop-cli -- migrate
//! cargo run -p myshop-storefront
//!
//! # In another shell
//! cargo test -p myshop-integration-tests -- --ignored
//! ```
//!
//! Tests talk to the running server over HTTP and write their own fixture
//! category (`integration-tests`) straight into the database.
//!
//! # Environment Variables
//!
//! - `MYSHOP_TEST_URL` - Storefront URL (default: `http://127.0.0.1:8000`)
//! - `MYSHOP_DATABASE_URL` / `DATABASE_URL` - Same database the server uses

use std::str::FromStr;

use reqwest::Client;
use rust_decimal::Decimal;
use secrecy::SecretString;

use myshop_storefront::db::{self, CatalogRepository};
use myshop_storefront::models::{NewProduct, Product};

/// Slug of the category holding integration fixtures.
pub const FIXTURE_CATEGORY: &str = "integration-tests";

/// Base URL for the storefront under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("MYSHOP_TEST_URL").unwrap_or_else(|_| "http://127.0.0.1:8000".to_string())
}

/// A client that keeps the session cookie between requests, like a browser.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialized.
pub fn browser() -> reqwest::Result<Client> {
    Client::builder().cookie_store(true).build()
}

/// Upsert a fixture product and return it as stored.
///
/// # Errors
///
/// Returns an error if the database URL is missing or a write fails.
pub async fn fixture_product(
    slug: &str,
    price: &str,
    available: bool,
) -> Result<Product, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let url = std::env::var("MYSHOP_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| "MYSHOP_DATABASE_URL not set")?;

    let pool = db::create_pool(&SecretString::from(url)).await?;
    let repo = CatalogRepository::new(&pool);
    let category = repo
        .upsert_category("Integration Tests", FIXTURE_CATEGORY)
        .await?;

    let product = NewProduct {
        name: format!("Fixture {slug}"),
        slug: slug.to_string(),
        image: None,
        description: "Created by the integration tests.".to_string(),
        price: Decimal::from_str(price)?,
        available,
    };
    Ok(repo.upsert_product(category.id, &product).await?)
}
