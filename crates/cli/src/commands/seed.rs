//! Seed the catalog from a YAML file.
//!
//! Categories are matched by slug and products by slug within their
//! category, so running the same file twice updates rows in place.
//!
//! ```yaml
//! categories:
//!   - name: Tea
//!     slug: tea
//!     products:
//!       - name: Green Tea
//!         slug: green-tea
//!         price: "4.50"
//!         description: Loose leaf, 100 g
//!         image: products/green-tea.png
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use myshop_storefront::db::{self, CatalogRepository, RepositoryError};
use myshop_storefront::models::NewProduct;

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid catalog: {0}")]
    Invalid(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Top-level seed file.
#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    pub categories: Vec<SeedCategory>,
}

/// A category and the products listed under it.
#[derive(Debug, Deserialize)]
pub struct SeedCategory {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub products: Vec<NewProduct>,
}

/// Rows written by a seed run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub products: usize,
}

/// Check slugs and prices before touching the database.
///
/// # Errors
///
/// Returns `SeedError::Invalid` describing the first problem found.
pub fn validate(catalog: &CatalogFile) -> Result<(), SeedError> {
    let mut category_slugs = HashSet::new();

    for category in &catalog.categories {
        if !is_slug(&category.slug) {
            return Err(SeedError::Invalid(format!(
                "category {:?} has invalid slug {:?}",
                category.name, category.slug
            )));
        }
        if !category_slugs.insert(category.slug.as_str()) {
            return Err(SeedError::Invalid(format!(
                "duplicate category slug {:?}",
                category.slug
            )));
        }

        let mut product_slugs = HashSet::new();
        for product in &category.products {
            if !is_slug(&product.slug) {
                return Err(SeedError::Invalid(format!(
                    "product {:?} has invalid slug {:?}",
                    product.name, product.slug
                )));
            }
            if !product_slugs.insert(product.slug.as_str()) {
                return Err(SeedError::Invalid(format!(
                    "duplicate product slug {:?} in category {:?}",
                    product.slug, category.slug
                )));
            }
            if product.price.is_sign_negative() {
                return Err(SeedError::Invalid(format!(
                    "product {:?} has negative price {}",
                    product.slug, product.price
                )));
            }
            if product.price.scale() > 2 {
                return Err(SeedError::Invalid(format!(
                    "product {:?} price {} has more than two decimal places",
                    product.slug, product.price
                )));
            }
        }
    }

    Ok(())
}

/// Letters, digits, hyphens and underscores only.
fn is_slug(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Parse a seed file's contents.
///
/// # Errors
///
/// Returns an error if the YAML is malformed or fails validation.
pub fn parse(content: &str) -> Result<CatalogFile, SeedError> {
    let catalog: CatalogFile = serde_yaml::from_str(content)?;
    validate(&catalog)?;
    Ok(catalog)
}

/// Upsert every category and product from `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, the database URL is
/// missing, or a database write fails.
pub async fn run(path: &Path) -> Result<SeedSummary, SeedError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SeedError::Read {
            path: path.display().to_string(),
            source,
        })?;
    let catalog = parse(&content)?;
    info!(
        path = %path.display(),
        categories = catalog.categories.len(),
        "Parsed catalog"
    );

    let database_url =
        super::database_url().ok_or(SeedError::MissingEnvVar("MYSHOP_DATABASE_URL"))?;
    let pool = db::create_pool(&database_url).await?;
    let repo = CatalogRepository::new(&pool);

    let mut summary = SeedSummary::default();
    for seed in &catalog.categories {
        let category = repo.upsert_category(&seed.name, &seed.slug).await?;
        summary.categories += 1;

        for product in &seed.products {
            let saved = repo.upsert_product(category.id, product).await?;
            info!(category = %category.slug, product = %saved.slug, id = %saved.id, "Upserted product");
            summary.products += 1;
        }
    }

    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
categories:
  - name: Tea
    slug: tea
    products:
      - name: Green Tea
        slug: green-tea
        price: "4.50"
      - name: Retired Blend
        slug: retired-blend
        price: "3.00"
        available: false
  - name: Mugs
    slug: mugs
"#;

    #[test]
    fn test_parse_sample() {
        let catalog = parse(SAMPLE).unwrap();
        assert_eq!(catalog.categories.len(), 2);

        let tea = catalog.categories.first().unwrap();
        assert_eq!(tea.products.len(), 2);
        assert!(tea.products.first().unwrap().available);
        assert!(!tea.products.last().unwrap().available);
        assert_eq!(tea.products.first().unwrap().price.to_string(), "4.50");

        assert!(catalog.categories.last().unwrap().products.is_empty());
    }

    #[test]
    fn test_duplicate_category_slug_rejected() {
        let yaml = r"
categories:
  - { name: Tea, slug: tea }
  - { name: More Tea, slug: tea }
";
        assert!(matches!(parse(yaml), Err(SeedError::Invalid(_))));
    }

    #[test]
    fn test_negative_price_rejected() {
        let yaml = r#"
categories:
  - name: Tea
    slug: tea
    products:
      - { name: Refund, slug: refund, price: "-1.00" }
"#;
        assert!(matches!(parse(yaml), Err(SeedError::Invalid(_))));
    }

    #[test]
    fn test_sub_cent_price_rejected() {
        let yaml = r#"
categories:
  - name: Tea
    slug: tea
    products:
      - { name: Sample, slug: sample, price: "0.005" }
"#;
        assert!(matches!(parse(yaml), Err(SeedError::Invalid(_))));
    }

    #[test]
    fn test_is_slug() {
        assert!(is_slug("green-tea"));
        assert!(is_slug("tea_2"));
        assert!(!is_slug(""));
        assert!(!is_slug("green tea"));
        assert!(!is_slug("té"));
    }
}
