//! Cart route handlers.
//!
//! The cart lives in the visitor's session. Each handler loads a snapshot,
//! runs cart operations on it and writes it back before responding.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::Redirect,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use myshop_core::{Cart, EnrichedLine, MemorySession, Price, ProductId};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::Product;
use crate::services::{CartSession, cart_items};
use crate::state::AppState;

/// Largest quantity the add form accepts.
pub const MAX_QUANTITY: u32 = 20;

// =============================================================================
// Views
// =============================================================================

/// Cart badge shown in the page header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSummary {
    pub count: u64,
    pub total: String,
}

impl CartSummary {
    fn from_cart(cart: &Cart<'_, MemorySession>) -> Self {
        Self {
            count: cart.count(),
            total: Price::from_amount(cart.total_price()).display(),
        }
    }
}

/// One entry of a quantity `<select>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantityOption {
    pub value: u32,
    pub selected: bool,
}

/// Options `1..=MAX_QUANTITY`, with `current` preselected when in range.
#[must_use]
pub fn quantity_options(current: u32) -> Vec<QuantityOption> {
    (1..=MAX_QUANTITY)
        .map(|value| QuantityOption {
            value,
            selected: value == current,
        })
        .collect()
}

/// Cart line display data for templates.
#[derive(Debug, Clone)]
pub struct CartLineView {
    pub product_id: String,
    pub name: String,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub quantity: u32,
    pub quantity_options: Vec<QuantityOption>,
    pub unit_price: String,
    pub total_price: String,
}

impl CartLineView {
    fn new(line: EnrichedLine<Product>, state: &AppState) -> Self {
        let (name, url, image_url) = match &line.product {
            Some(product) => (
                product.name.clone(),
                Some(product.url()),
                product
                    .image
                    .as_deref()
                    .map(|path| state.config().media.image_url(path)),
            ),
            None => (format!("Product #{}", line.product_id), None, None),
        };

        Self {
            product_id: line.product_id.to_string(),
            name,
            url,
            image_url,
            quantity: line.quantity,
            quantity_options: quantity_options(line.quantity),
            unit_price: Price::from_amount(line.unit_price).display(),
            total_price: Price::from_amount(line.total_price).display(),
        }
    }
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/detail.html")]
pub struct CartDetailTemplate {
    pub cart: CartSummary,
    pub lines: Vec<CartLineView>,
}

// =============================================================================
// Forms
// =============================================================================

/// Add-to-cart form as posted by the product and cart pages.
///
/// Fields are kept as raw strings so a bad submission can be redirected
/// instead of rejected by the extractor.
#[derive(Debug, Default, Deserialize)]
pub struct CartAddForm {
    pub quantity: Option<String>,
    #[serde(rename = "override")]
    pub override_quantity: Option<String>,
}

/// A validated add-to-cart request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartAdd {
    pub quantity: u32,
    pub override_quantity: bool,
}

impl CartAddForm {
    /// Validate the quantity choice and the override flag.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> std::result::Result<CartAdd, String> {
        let raw = self.quantity.as_deref().map(str::trim).unwrap_or_default();
        let quantity = raw
            .parse::<u32>()
            .ok()
            .filter(|q| (1..=MAX_QUANTITY).contains(q))
            .ok_or_else(|| format!("quantity must be 1-{MAX_QUANTITY}, got {raw:?}"))?;

        let override_quantity = parse_checkbox(self.override_quantity.as_deref())
            .ok_or_else(|| format!("invalid override flag {:?}", self.override_quantity))?;

        Ok(CartAdd {
            quantity,
            override_quantity,
        })
    }
}

/// Read a boolean form field. Absent or empty means `false`.
fn parse_checkbox(value: Option<&str>) -> Option<bool> {
    match value.map(str::trim) {
        None | Some("" | "false" | "False" | "0") => Some(false),
        Some("true" | "True" | "on" | "1") => Some(true),
        Some(_) => None,
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Look up a product by the raw id from the URL.
async fn find_product(state: &AppState, raw_id: &str) -> Result<Product> {
    let id: ProductId = raw_id
        .parse()
        .map_err(|_| AppError::NotFound(format!("product {raw_id}")))?;

    state
        .catalog()
        .get_product(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

/// Load the cart badge for a page, initializing the cart if needed.
///
/// # Errors
///
/// Returns `AppError::Session` if the session store fails.
pub async fn cart_summary(state: &AppState, session: Session) -> Result<CartSummary> {
    let mut cart_session = CartSession::load(session, &state.config().cart_session_key).await?;
    let summary = CartSummary::from_cart(&cart_session.cart());
    cart_session.save().await?;
    Ok(summary)
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<CartDetailTemplate> {
    let mut cart_session = CartSession::load(session, &state.config().cart_session_key).await?;
    let cart = cart_session.cart();

    let catalog = state.catalog();
    let items = cart_items(&catalog, &cart).await?;
    let summary = CartSummary::from_cart(&cart);
    drop(cart);
    cart_session.save().await?;

    let lines = items
        .into_iter()
        .map(|line| CartLineView::new(line, &state))
        .collect();

    Ok(CartDetailTemplate {
        cart: summary,
        lines,
    })
}

/// Add a product to the cart, or set its quantity when `override` is on.
///
/// An invalid form leaves the cart untouched; either way the visitor lands
/// on the cart page.
#[instrument(skip(state, session, form))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<String>,
    Form(form): Form<CartAddForm>,
) -> Result<Redirect> {
    let product = find_product(&state, &product_id).await?;

    let request = match form.validate() {
        Ok(request) => request,
        Err(reason) => {
            tracing::debug!(product_id = %product.id, %reason, "Ignoring invalid cart form");
            return Ok(Redirect::to("/cart"));
        }
    };

    let mut cart_session = CartSession::load(session, &state.config().cart_session_key).await?;
    cart_session
        .cart()
        .add(&product, request.quantity, request.override_quantity);
    cart_session.save().await?;

    add_breadcrumb(
        "cart",
        "Updated cart",
        &[
            ("product_id", product.id.to_string()),
            ("quantity", request.quantity.to_string()),
            ("override", request.override_quantity.to_string()),
        ],
    );
    tracing::info!(
        product_id = %product.id,
        quantity = request.quantity,
        override_quantity = request.override_quantity,
        "Product added to cart"
    );

    Ok(Redirect::to("/cart"))
}

/// Remove a product from the cart.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<String>,
) -> Result<Redirect> {
    let product = find_product(&state, &product_id).await?;

    let mut cart_session = CartSession::load(session, &state.config().cart_session_key).await?;
    let removed = cart_session.cart().remove(product.id);
    cart_session.save().await?;

    if removed {
        tracing::info!(product_id = %product.id, "Product removed from cart");
    }

    Ok(Redirect::to("/cart"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(quantity: Option<&str>, override_quantity: Option<&str>) -> CartAddForm {
        CartAddForm {
            quantity: quantity.map(String::from),
            override_quantity: override_quantity.map(String::from),
        }
    }

    #[test]
    fn test_validate_accepts_choices() {
        assert_eq!(
            form(Some("2"), None).validate().unwrap(),
            CartAdd {
                quantity: 2,
                override_quantity: false
            }
        );
        assert_eq!(form(Some("20"), Some("True")).validate().unwrap().quantity, 20);
    }

    #[test]
    fn test_validate_rejects_out_of_range_quantity() {
        assert!(form(Some("0"), None).validate().is_err());
        assert!(form(Some("21"), None).validate().is_err());
        assert!(form(Some("-1"), None).validate().is_err());
        assert!(form(Some("two"), None).validate().is_err());
        assert!(form(None, None).validate().is_err());
    }

    #[test]
    fn test_override_checkbox_values() {
        for truthy in ["true", "True", "on", "1"] {
            assert!(form(Some("1"), Some(truthy)).validate().unwrap().override_quantity);
        }
        for falsy in ["", "false", "False", "0"] {
            assert!(!form(Some("1"), Some(falsy)).validate().unwrap().override_quantity);
        }
        assert!(form(Some("1"), Some("maybe")).validate().is_err());
    }

    #[test]
    fn test_form_deserializes_override_field() {
        let form: CartAddForm = serde_json::from_value(serde_json::json!({
            "quantity": "3",
            "override": "True",
        }))
        .unwrap();
        assert_eq!(
            form.validate().unwrap(),
            CartAdd {
                quantity: 3,
                override_quantity: true
            }
        );
    }

    #[test]
    fn test_quantity_options_preselect_current() {
        let options = quantity_options(4);
        assert_eq!(options.len(), 20);
        assert_eq!(options.first().map(|o| o.value), Some(1));
        let selected: Vec<u32> = options.iter().filter(|o| o.selected).map(|o| o.value).collect();
        assert_eq!(selected, vec![4]);

        assert!(quantity_options(35).iter().all(|o| !o.selected));
    }

    #[test]
    fn test_summary_from_cart() {
        let mut snapshot = MemorySession::new();
        let mut cart = Cart::new(&mut snapshot);
        cart.add(&crate::models::catalog::fixtures::product(1, "Tea", "9.99"), 2, false);
        cart.add(&crate::models::catalog::fixtures::product(2, "Mug", "5.00"), 1, false);

        assert_eq!(
            CartSummary::from_cart(&cart),
            CartSummary {
                count: 3,
                total: "$24.98".to_string()
            }
        );
    }
}
