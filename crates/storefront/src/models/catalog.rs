//! Catalog domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use myshop_core::{CatalogItem, CategoryId, Price, ProductId};

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// Unique category ID.
    pub id: CategoryId,
    /// Display name.
    pub name: String,
    /// URL slug (unique).
    pub slug: String,
}

impl Category {
    /// Listing page for this category.
    #[must_use]
    pub fn url(&self) -> String {
        format!("/{}/", self.slug)
    }
}

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Category the product belongs to.
    pub category_id: CategoryId,
    /// Display name.
    pub name: String,
    /// URL slug (unique together with the id).
    pub slug: String,
    /// Image path relative to the media root.
    pub image: Option<String>,
    /// Long description.
    pub description: String,
    /// Current unit price.
    pub price: Decimal,
    /// Whether the product is shown and can be browsed.
    pub available: bool,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Detail page for this product.
    #[must_use]
    pub fn url(&self) -> String {
        format!("/{}/{}/", self.id, self.slug)
    }

    /// Current price with currency.
    #[must_use]
    pub fn display_price(&self) -> Price {
        Price::from_amount(self.price)
    }
}

impl CatalogItem for Product {
    fn product_id(&self) -> ProductId {
        self.id
    }

    fn unit_price(&self) -> Decimal {
        self.price
    }
}

/// Fields needed to create or update a product.
///
/// Deserializable so catalog seed files can be read straight into it.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    #[serde(default = "default_available")]
    pub available: bool,
}

const fn default_available() -> bool {
    true
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Build a product for tests.
    #[allow(clippy::unwrap_used)]
    pub fn product(id: i32, name: &str, price: &str) -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::new(id),
            category_id: CategoryId::new(1),
            name: name.to_string(),
            slug: name.to_lowercase().replace(' ', "-"),
            image: None,
            description: String::new(),
            price: price.parse().unwrap(),
            available: true,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::product;
    use super::*;

    #[test]
    fn test_product_url() {
        let product = product(12, "Green Tea", "4.50");
        assert_eq!(product.url(), "/12/green-tea/");
    }

    #[test]
    fn test_category_url() {
        let category = Category {
            id: CategoryId::new(1),
            name: "Tea".to_string(),
            slug: "tea".to_string(),
        };
        assert_eq!(category.url(), "/tea/");
    }

    #[test]
    fn test_catalog_item_uses_current_price() {
        let product = product(3, "Mug", "12.00");
        assert_eq!(product.product_id(), ProductId::new(3));
        assert_eq!(product.unit_price(), Decimal::new(1200, 2));
        assert_eq!(product.display_price().display(), "$12.00");
    }
}
