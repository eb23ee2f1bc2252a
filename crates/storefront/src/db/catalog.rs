//! Catalog repository for category and product queries.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use myshop_core::{CategoryId, ProductId};

use super::RepositoryError;
use crate::models::{Category, NewProduct, Product};
use crate::services::cart::ProductLookup;

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` category queries.
#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    name: String,
    slug: String,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            name: row.name,
            slug: row.slug,
        }
    }
}

/// Internal row type for `PostgreSQL` product queries.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    category_id: i32,
    name: String,
    slug: String,
    image: String,
    description: String,
    price: Decimal,
    available: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        if row.price.is_sign_negative() {
            return Err(RepositoryError::DataCorruption(format!(
                "negative price {} for product {}",
                row.price, row.id
            )));
        }

        Ok(Self {
            id: ProductId::new(row.id),
            category_id: CategoryId::new(row.category_id),
            name: row.name,
            slug: row.slug,
            image: Some(row.image).filter(|path| !path.is_empty()),
            description: row.description,
            price: row.price,
            available: row.available,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_products(rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
    rows.into_iter().map(Product::try_from).collect()
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for catalog database operations.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all categories ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, name, slug
            FROM shop.category
            ORDER BY name
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    /// Get a category by its slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_category_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, name, slug
            FROM shop.category
            WHERE slug = $1
            ",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Category::from))
    }

    /// Get a category by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, name, slug
            FROM shop.category
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Category::from))
    }

    /// List available products, optionally limited to one category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a row holds an invalid price.
    pub async fn list_available_products(
        &self,
        category: Option<CategoryId>,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, category_id, name, slug, image, description, price, available,
                   created_at, updated_at
            FROM shop.product
            WHERE available
              AND ($1::INT IS NULL OR category_id = $1)
            ORDER BY name
            ",
        )
        .bind(category.map(|id| id.as_i32()))
        .fetch_all(self.pool)
        .await?;

        into_products(rows)
    }

    /// Get an available product by id and slug (both must match).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the row holds an invalid price.
    pub async fn get_available_product(
        &self,
        id: ProductId,
        slug: &str,
    ) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, category_id, name, slug, image, description, price, available,
                   created_at, updated_at
            FROM shop.product
            WHERE id = $1 AND slug = $2 AND available
            ",
        )
        .bind(id.as_i32())
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Get a product by id regardless of availability.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the row holds an invalid price.
    pub async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, category_id, name, slug, image, description, price, available,
                   created_at, updated_at
            FROM shop.product
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Fetch every product whose id is in `ids`, in one query.
    ///
    /// Ids with no matching row are simply absent from the result.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a row holds an invalid price.
    pub async fn get_products_by_ids(
        &self,
        ids: &[ProductId],
    ) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, category_id, name, slug, image, description, price, available,
                   created_at, updated_at
            FROM shop.product
            WHERE id = ANY($1)
            ",
        )
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        into_products(rows)
    }

    /// Insert a category, or rename the existing one with the same slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_category(&self, name: &str, slug: &str) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            INSERT INTO shop.category (name, slug)
            VALUES ($1, $2)
            ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name, slug
            ",
        )
        .bind(name)
        .bind(slug)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Insert a product into `category`, or update the one with the same slug there.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if `category` does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn upsert_product(
        &self,
        category: CategoryId,
        product: &NewProduct,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO shop.product (category_id, name, slug, image, description, price, available)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (category_id, slug) DO UPDATE SET
                name = EXCLUDED.name,
                image = EXCLUDED.image,
                description = EXCLUDED.description,
                price = EXCLUDED.price,
                available = EXCLUDED.available,
                updated_at = now()
            RETURNING id, category_id, name, slug, image, description, price, available,
                      created_at, updated_at
            ",
        )
        .bind(category.as_i32())
        .bind(&product.name)
        .bind(&product.slug)
        .bind(product.image.as_deref().unwrap_or_default())
        .bind(&product.description)
        .bind(product.price)
        .bind(product.available)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::Conflict(format!("category {category} does not exist"));
            }
            RepositoryError::Database(e)
        })?;

        row.try_into()
    }
}

impl ProductLookup for CatalogRepository<'_> {
    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        self.get_products_by_ids(ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(image: &str, price: Decimal) -> ProductRow {
        let now = Utc::now();
        ProductRow {
            id: 5,
            category_id: 2,
            name: "Black Tea".to_string(),
            slug: "black-tea".to_string(),
            image: image.to_string(),
            description: String::new(),
            price,
            available: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_row_without_image() {
        let product = Product::try_from(row("", Decimal::new(450, 2))).unwrap_or_else(|e| {
            panic!("conversion failed: {e}");
        });
        assert_eq!(product.image, None);
        assert_eq!(product.id, ProductId::new(5));
        assert_eq!(product.category_id, CategoryId::new(2));
    }

    #[test]
    fn test_row_with_image() {
        let product = Product::try_from(row("products/tea.png", Decimal::ONE)).ok();
        assert_eq!(
            product.and_then(|p| p.image).as_deref(),
            Some("products/tea.png")
        );
    }

    #[test]
    fn test_row_with_negative_price_is_corrupt() {
        let result = Product::try_from(row("", Decimal::new(-1, 0)));
        assert!(matches!(result, Err(RepositoryError::DataCorruption(_))));
    }
}
