//! Session-backed shopping cart.
//!
//! A [`Cart`] is a typed view over one value in a visitor's session. It owns
//! no storage: every mutation is written straight back through the
//! [`SessionStore`] and the session is marked modified so its owner flushes it.
//!
//! # Session format
//!
//! The value under the cart key maps the decimal product id to a record:
//!
//! ```json
//! { "12": { "quantity": 2, "price": "9.99" } }
//! ```
//!
//! Prices are `Decimal` display strings (scale preserved, so `"5.00"` stays
//! `"5.00"`) and are parsed back exactly. A value that does not decode is
//! discarded and replaced with an empty cart.

mod line;
mod session;

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde_json::{Map, Value};
use thiserror::Error;

pub use line::{CartLine, CatalogItem, EnrichedLine};
pub use session::{MemorySession, SessionStore};

use crate::types::ProductId;
use line::StoredLine;

/// Session key used when none is configured.
pub const DEFAULT_SESSION_KEY: &str = "cart";

/// Errors decoding a cart from its session value.
#[derive(Debug, Error)]
pub enum CartDecodeError {
    /// The value or one of its records has the wrong shape.
    #[error("malformed cart: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A key is not a product id.
    #[error("invalid product id in cart: {0:?}")]
    InvalidProductId(String),
}

/// A visitor's shopping cart.
///
/// Borrows the session for its lifetime; build one per request.
pub struct Cart<'s, S: SessionStore> {
    session: &'s mut S,
    key: String,
    lines: BTreeMap<ProductId, CartLine>,
}

impl<'s, S: SessionStore> Cart<'s, S> {
    /// Open the cart stored under [`DEFAULT_SESSION_KEY`].
    pub fn new(session: &'s mut S) -> Self {
        Self::with_key(session, DEFAULT_SESSION_KEY)
    }

    /// Open the cart stored under `key`.
    ///
    /// If the session has no cart, or the stored value cannot be decoded, an
    /// empty cart is written to the session. Existing carts are left as-is.
    pub fn with_key(session: &'s mut S, key: impl Into<String>) -> Self {
        let key = key.into();

        let lines = match session.get(&key).map(decode_lines) {
            Some(Ok(lines)) => Some(lines),
            Some(Err(e)) => {
                tracing::warn!(key = %key, error = %e, "Discarding unreadable cart from session");
                None
            }
            None => None,
        };

        let missing = lines.is_none();
        let mut cart = Self {
            session,
            key,
            lines: lines.unwrap_or_default(),
        };
        if missing {
            cart.save();
        }
        cart
    }

    /// Add `quantity` units of `product`.
    ///
    /// A product not yet in the cart gets a new line priced at the product's
    /// current price. With `override_quantity` the stored quantity is
    /// replaced, otherwise it is increased.
    pub fn add(&mut self, product: &impl CatalogItem, quantity: u32, override_quantity: bool) {
        let product_id = product.product_id();
        let line = self
            .lines
            .entry(product_id)
            .or_insert_with(|| CartLine::new(product_id, product.unit_price()));

        if override_quantity {
            line.set_quantity(quantity);
        } else {
            line.increase_quantity(quantity);
        }

        self.save();
    }

    /// Remove the line for `product_id`.
    ///
    /// Returns `false` (and leaves the session untouched) if there was none.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        if self.lines.remove(&product_id).is_none() {
            return false;
        }
        self.save();
        true
    }

    /// Empty the cart and drop its key from the session entirely.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.session.remove(&self.key);
        self.session.mark_modified();
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.lines
            .values()
            .map(|line| u64::from(line.quantity()))
            .sum()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of `unit_price × quantity` over all lines.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.lines.values().map(CartLine::total_price).sum()
    }

    /// Line for `product_id`, if present.
    #[must_use]
    pub fn get(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.get(&product_id)
    }

    /// All lines, ordered by product id.
    pub fn lines(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.values()
    }

    /// Ids to fetch from the catalog before calling [`Cart::enrich`].
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.lines.keys().copied().collect()
    }

    /// Join the lines with catalog records fetched in one batch.
    ///
    /// `products` is whatever subset of [`Cart::product_ids`] the catalog
    /// still has. Lines without a match are yielded with `product: None`.
    /// Products that are not in the cart are ignored.
    pub fn enrich<P: CatalogItem>(
        &self,
        products: impl IntoIterator<Item = P>,
    ) -> impl Iterator<Item = EnrichedLine<P>> {
        let mut by_id: HashMap<ProductId, P> = products
            .into_iter()
            .map(|product| (product.product_id(), product))
            .collect();

        self.lines
            .values()
            .map(move |line| EnrichedLine::new(line, by_id.remove(&line.product_id())))
    }

    /// Session key this cart is stored under.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    fn save(&mut self) {
        let value: Map<String, Value> = self
            .lines
            .values()
            .map(|line| (line.product_id().to_string(), line.to_record()))
            .collect();
        self.session.set(&self.key, Value::Object(value));
        self.session.mark_modified();
    }
}

impl<S: SessionStore> std::fmt::Debug for Cart<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cart")
            .field("key", &self.key)
            .field("lines", &self.lines)
            .finish_non_exhaustive()
    }
}

fn decode_lines(value: &Value) -> Result<BTreeMap<ProductId, CartLine>, CartDecodeError> {
    let stored: BTreeMap<String, StoredLine> = serde_json::from_value(value.clone())?;

    stored
        .into_iter()
        .map(|(key, record)| {
            let product_id = key
                .parse::<ProductId>()
                .map_err(|_| CartDecodeError::InvalidProductId(key.clone()))?;
            Ok((product_id, CartLine::from_record(product_id, &record)))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct TestProduct {
        id: ProductId,
        price: Decimal,
    }

    impl TestProduct {
        fn new(id: i32, price: &str) -> Self {
            Self {
                id: ProductId::new(id),
                price: price.parse().unwrap(),
            }
        }
    }

    impl CatalogItem for TestProduct {
        fn product_id(&self) -> ProductId {
            self.id
        }

        fn unit_price(&self) -> Decimal {
            self.price
        }
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_new_session_gets_empty_cart() {
        let mut session = MemorySession::new();
        let cart = Cart::new(&mut session);
        assert_eq!(cart.count(), 0);
        assert!(cart.is_empty());
        drop(cart);

        assert_eq!(session.get(DEFAULT_SESSION_KEY), Some(&json!({})));
        assert!(session.is_modified());
    }

    #[test]
    fn test_reopening_preserves_existing_cart() {
        let mut session = MemorySession::with_value(
            "cart",
            json!({"4": {"quantity": 2, "price": "9.99"}}),
        );

        let cart = Cart::new(&mut session);
        assert_eq!(cart.count(), 2);
        assert_eq!(cart.get(ProductId::new(4)).unwrap().unit_price(), dec("9.99"));
        drop(cart);

        assert!(!session.is_modified());
        assert_eq!(
            session.get("cart"),
            Some(&json!({"4": {"quantity": 2, "price": "9.99"}}))
        );
    }

    #[test]
    fn test_malformed_cart_is_replaced() {
        let mut session = MemorySession::with_value("cart", json!({"abc": {"quantity": 1}}));
        let cart = Cart::new(&mut session);
        assert!(cart.is_empty());
        drop(cart);
        assert_eq!(session.get("cart"), Some(&json!({})));

        let mut session = MemorySession::with_value("cart", json!([1, 2, 3]));
        assert!(Cart::new(&mut session).is_empty());
    }

    #[test]
    fn test_custom_key() {
        let mut session = MemorySession::new();
        let mut cart = Cart::with_key(&mut session, "basket");
        cart.add(&TestProduct::new(1, "1.00"), 1, false);
        assert_eq!(cart.key(), "basket");
        drop(cart);
        assert!(session.contains_key("basket"));
        assert!(!session.contains_key(DEFAULT_SESSION_KEY));
    }

    #[test]
    fn test_add_accumulates() {
        let mut session = MemorySession::new();
        let mut cart = Cart::new(&mut session);
        let product = TestProduct::new(7, "3.50");

        cart.add(&product, 2, false);
        cart.add(&product, 3, false);

        assert_eq!(cart.get(product.id).unwrap().quantity(), 5);
        assert_eq!(cart.count(), 5);
    }

    #[test]
    fn test_add_with_override_replaces() {
        let mut session = MemorySession::new();
        let mut cart = Cart::new(&mut session);
        let product = TestProduct::new(7, "3.50");

        cart.add(&product, 2, false);
        cart.add(&product, 5, true);

        assert_eq!(cart.get(product.id).unwrap().quantity(), 5);
    }

    #[test]
    fn test_price_is_snapshotted_on_first_add() {
        let mut session = MemorySession::new();
        let mut cart = Cart::new(&mut session);

        cart.add(&TestProduct::new(1, "10.00"), 1, false);
        cart.add(&TestProduct::new(1, "12.00"), 1, false);

        let line = cart.get(ProductId::new(1)).unwrap();
        assert_eq!(line.unit_price(), dec("10.00"));
        assert_eq!(cart.total_price(), dec("20.00"));
    }

    #[test]
    fn test_price_refreshes_when_line_is_recreated() {
        let mut session = MemorySession::new();
        let mut cart = Cart::new(&mut session);

        cart.add(&TestProduct::new(1, "10.00"), 1, false);
        assert!(cart.remove(ProductId::new(1)));
        cart.add(&TestProduct::new(1, "12.00"), 1, false);

        assert_eq!(cart.get(ProductId::new(1)).unwrap().unit_price(), dec("12.00"));
    }

    #[test]
    fn test_total_price_is_exact_decimal() {
        let mut session = MemorySession::new();
        let mut cart = Cart::new(&mut session);

        cart.add(&TestProduct::new(1, "9.99"), 2, false);
        cart.add(&TestProduct::new(2, "5.00"), 1, false);

        assert_eq!(cart.total_price(), dec("24.98"));
        assert_eq!(cart.count(), 3);
    }

    #[test]
    fn test_add_writes_through_to_session() {
        let mut session = MemorySession::new();
        let mut cart = Cart::new(&mut session);
        cart.add(&TestProduct::new(12, "9.99"), 2, false);
        drop(cart);

        assert!(session.is_modified());
        assert_eq!(
            session.get("cart"),
            Some(&json!({"12": {"quantity": 2, "price": "9.99"}}))
        );
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut session = MemorySession::with_value(
            "cart",
            json!({"1": {"quantity": 1, "price": "2.00"}}),
        );
        let mut cart = Cart::new(&mut session);

        assert!(!cart.remove(ProductId::new(99)));
        assert_eq!(cart.count(), 1);
        drop(cart);
        assert!(!session.is_modified());
    }

    #[test]
    fn test_remove_present_line() {
        let mut session = MemorySession::new();
        let mut cart = Cart::new(&mut session);
        cart.add(&TestProduct::new(1, "1.00"), 4, false);
        cart.add(&TestProduct::new(2, "1.00"), 1, false);

        assert!(cart.remove(ProductId::new(1)));
        assert_eq!(cart.count(), 1);
        drop(cart);
        assert_eq!(
            session.get("cart"),
            Some(&json!({"2": {"quantity": 1, "price": "1.00"}}))
        );
    }

    #[test]
    fn test_clear_drops_session_key() {
        let mut session = MemorySession::new();
        let mut cart = Cart::new(&mut session);
        cart.add(&TestProduct::new(1, "1.00"), 4, false);

        cart.clear();
        assert_eq!(cart.count(), 0);
        assert_eq!(cart.total_price(), Decimal::ZERO);
        drop(cart);

        assert!(!session.contains_key("cart"));
        assert!(session.is_modified());
    }

    #[test]
    fn test_count_tracks_mixed_operations() {
        let mut session = MemorySession::new();
        let mut cart = Cart::new(&mut session);
        let a = TestProduct::new(1, "1.00");
        let b = TestProduct::new(2, "2.00");

        cart.add(&a, 3, false);
        cart.add(&b, 2, false);
        assert_eq!(cart.count(), 5);
        cart.add(&a, 1, true);
        assert_eq!(cart.count(), 3);
        cart.remove(b.id);
        assert_eq!(cart.count(), 1);
        cart.clear();
        assert_eq!(cart.count(), 0);
        cart.add(&b, 2, false);
        assert_eq!(cart.count(), 2);

        let summed: u64 = cart.lines().map(|l| u64::from(l.quantity())).sum();
        assert_eq!(cart.count(), summed);
    }

    #[test]
    fn test_enrich_attaches_products_and_keeps_ghost_lines() {
        let mut session = MemorySession::new();
        let mut cart = Cart::new(&mut session);
        let kept = TestProduct::new(1, "9.99");
        let deleted = TestProduct::new(2, "5.00");
        cart.add(&kept, 2, false);
        cart.add(&deleted, 1, false);

        let lines: Vec<_> = cart.enrich(vec![kept.clone()]).collect();
        assert_eq!(lines.len(), 2);

        let first = lines.iter().find(|l| l.product_id == kept.id).unwrap();
        assert_eq!(first.product.as_ref(), Some(&kept));
        assert_eq!(first.total_price, dec("19.98"));

        let ghost = lines.iter().find(|l| l.product_id == deleted.id).unwrap();
        assert!(ghost.product.is_none());
        assert_eq!(ghost.unit_price, dec("5.00"));
        assert_eq!(ghost.total_price, dec("5.00"));
    }

    #[test]
    fn test_enrich_uses_snapshot_price_not_live_price() {
        let mut session = MemorySession::new();
        let mut cart = Cart::new(&mut session);
        cart.add(&TestProduct::new(1, "4.00"), 2, false);

        let repriced = TestProduct::new(1, "6.00");
        let line = cart.enrich(vec![repriced]).next().unwrap();
        assert_eq!(line.unit_price, dec("4.00"));
        assert_eq!(line.total_price, dec("8.00"));
    }

    #[test]
    fn test_enrich_is_restartable() {
        let mut session = MemorySession::new();
        let mut cart = Cart::new(&mut session);
        let product = TestProduct::new(1, "1.00");
        cart.add(&product, 1, false);

        assert_eq!(cart.enrich(vec![product.clone()]).count(), 1);
        assert_eq!(cart.enrich(vec![product]).count(), 1);
        assert_eq!(cart.enrich(Vec::<TestProduct>::new()).count(), 1);
    }

    #[test]
    fn test_decode_rejects_float_price() {
        let value = json!({"1": {"quantity": 1, "price": 9.99}});
        assert!(matches!(
            decode_lines(&value),
            Err(CartDecodeError::Malformed(_))
        ));
    }
}
