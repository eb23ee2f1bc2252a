//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use tower_sessions::Session;
use tracing::instrument;

use myshop_core::ProductId;

use super::cart::{CartSummary, QuantityOption, cart_summary, quantity_options};
use crate::error::{AppError, Result};
use crate::models::{Category, Product};
use crate::state::AppState;

/// Shown when a product has no image.
const NO_IMAGE_URL: &str = "/static/img/no_image.svg";

/// Category menu entry.
#[derive(Debug, Clone)]
pub struct CategoryLinkView {
    pub name: String,
    pub url: String,
    pub selected: bool,
}

/// Product display data for templates.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub url: String,
    pub image_url: String,
    pub price: String,
    pub description: String,
}

impl ProductView {
    fn new(product: &Product, state: &AppState) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            url: product.url(),
            image_url: product.image.as_deref().map_or_else(
                || NO_IMAGE_URL.to_string(),
                |path| state.config().media.image_url(path),
            ),
            price: product.display_price().display(),
            description: product.description.clone(),
        }
    }
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/list.html")]
pub struct ProductListTemplate {
    pub cart: CartSummary,
    pub title: String,
    /// True when no category filter is active.
    pub all_selected: bool,
    pub categories: Vec<CategoryLinkView>,
    pub products: Vec<ProductView>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/detail.html")]
pub struct ProductDetailTemplate {
    pub cart: CartSummary,
    pub product: ProductView,
    pub category: Option<CategoryLinkView>,
    pub quantity_options: Vec<QuantityOption>,
}

fn category_links(categories: &[Category], current: Option<&Category>) -> Vec<CategoryLinkView> {
    categories
        .iter()
        .map(|category| CategoryLinkView {
            name: category.name.clone(),
            url: category.url(),
            selected: current.is_some_and(|c| c.id == category.id),
        })
        .collect()
}

async fn render_list(
    state: &AppState,
    session: Session,
    category: Option<Category>,
) -> Result<ProductListTemplate> {
    let catalog = state.catalog();
    let categories = catalog.list_categories().await?;
    let products = catalog
        .list_available_products(category.as_ref().map(|c| c.id))
        .await?;

    Ok(ProductListTemplate {
        cart: cart_summary(state, session).await?,
        title: category
            .as_ref()
            .map_or_else(|| "Products".to_string(), |c| c.name.clone()),
        all_selected: category.is_none(),
        categories: category_links(&categories, category.as_ref()),
        products: products.iter().map(|p| ProductView::new(p, state)).collect(),
    })
}

/// Display every available product.
#[instrument(skip(state, session))]
pub async fn index(State(state): State<AppState>, session: Session) -> Result<ProductListTemplate> {
    render_list(&state, session, None).await
}

/// Display the available products of one category.
#[instrument(skip(state, session))]
pub async fn by_category(
    State(state): State<AppState>,
    session: Session,
    Path(category_slug): Path<String>,
) -> Result<ProductListTemplate> {
    let category = state
        .catalog()
        .get_category_by_slug(&category_slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category {category_slug}")))?;

    render_list(&state, session, Some(category)).await
}

/// Display product detail page with the add-to-cart form.
///
/// Id and slug must both match an available product.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path((id, slug)): Path<(String, String)>,
) -> Result<ProductDetailTemplate> {
    let not_found = || AppError::NotFound(format!("product {id}/{slug}"));

    let product_id: ProductId = id.parse().map_err(|_| not_found())?;
    let catalog = state.catalog();
    let product = catalog
        .get_available_product(product_id, &slug)
        .await?
        .ok_or_else(not_found)?;

    let category = catalog
        .get_category(product.category_id)
        .await?
        .map(|c| CategoryLinkView {
            url: c.url(),
            name: c.name,
            selected: true,
        });

    Ok(ProductDetailTemplate {
        cart: cart_summary(&state, session).await?,
        product: ProductView::new(&product, &state),
        category,
        quantity_options: quantity_options(1),
    })
}

#[cfg(test)]
mod tests {
    use myshop_core::CategoryId;

    use super::*;

    fn category(id: i32, name: &str) -> Category {
        Category {
            id: CategoryId::new(id),
            name: name.to_string(),
            slug: name.to_lowercase(),
        }
    }

    #[test]
    fn test_category_links_mark_current() {
        let categories = vec![category(1, "Tea"), category(2, "Mugs")];

        let links = category_links(&categories, categories.get(1));
        let selected: Vec<&str> = links
            .iter()
            .filter(|l| l.selected)
            .map(|l| l.url.as_str())
            .collect();
        assert_eq!(links.len(), 2);
        assert_eq!(selected, vec!["/mugs/"]);

        assert!(category_links(&categories, None).iter().all(|l| !l.selected));
    }
}
