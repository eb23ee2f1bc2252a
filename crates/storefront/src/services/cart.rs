//! Cart service.
//!
//! The core [`Cart`] works on a synchronous [`SessionStore`]. Tower sessions
//! are async, so each request takes a snapshot of the cart value into a
//! [`MemorySession`], runs cart operations against it, and writes it back
//! only if the cart marked it modified.

use std::future::Future;

use serde_json::Value;
use tower_sessions::Session;

use myshop_core::{Cart, EnrichedLine, MemorySession, ProductId, SessionStore};

use crate::db::RepositoryError;
use crate::models::Product;

/// Batched product lookup used to enrich cart lines.
pub trait ProductLookup {
    /// Fetch every product whose id is in `ids`; missing ids are skipped.
    fn products_by_ids(
        &self,
        ids: &[ProductId],
    ) -> impl Future<Output = Result<Vec<Product>, RepositoryError>> + Send;
}

/// Request-scoped cart snapshot backed by a tower session.
pub struct CartSession {
    session: Session,
    key: String,
    snapshot: MemorySession,
}

impl CartSession {
    /// Read the cart value stored under `key` into a fresh snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub async fn load(session: Session, key: &str) -> Result<Self, tower_sessions::session::Error> {
        let snapshot = match session.get::<Value>(key).await? {
            Some(value) => MemorySession::with_value(key, value),
            None => MemorySession::new(),
        };

        Ok(Self {
            session,
            key: key.to_owned(),
            snapshot,
        })
    }

    /// Open the cart over this snapshot.
    pub fn cart(&mut self) -> Cart<'_, MemorySession> {
        Cart::with_key(&mut self.snapshot, self.key.as_str())
    }

    /// Write the snapshot back to the session if the cart changed it.
    ///
    /// A cleared cart removes the key from the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be written.
    pub async fn save(self) -> Result<(), tower_sessions::session::Error> {
        if !self.snapshot.is_modified() {
            return Ok(());
        }

        match self.snapshot.get(&self.key) {
            Some(value) => {
                self.session.insert(&self.key, value).await?;
                tracing::debug!(key = %self.key, "Cart written to session");
            }
            None => {
                self.session.remove::<Value>(&self.key).await?;
                tracing::debug!(key = %self.key, "Cart removed from session");
            }
        }
        Ok(())
    }
}

/// Enrich every cart line with its live product, using one catalog query.
///
/// An empty cart skips the query entirely.
///
/// # Errors
///
/// Returns the lookup's error if the catalog query fails.
pub async fn cart_items<L, S>(
    lookup: &L,
    cart: &Cart<'_, S>,
) -> Result<Vec<EnrichedLine<Product>>, RepositoryError>
where
    L: ProductLookup,
    S: SessionStore,
{
    let ids = cart.product_ids();
    let products = if ids.is_empty() {
        Vec::new()
    } else {
        lookup.products_by_ids(&ids).await?
    };

    let missing = ids.len().saturating_sub(products.len());
    if missing > 0 {
        tracing::debug!(missing, "Cart references products no longer in the catalog");
    }

    Ok(cart.enrich(products).collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rust_decimal::Decimal;
    use serde_json::json;
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::models::catalog::fixtures::product;

    struct StubCatalog {
        products: Vec<Product>,
        queries: AtomicUsize,
    }

    impl StubCatalog {
        fn new(products: Vec<Product>) -> Self {
            Self {
                products,
                queries: AtomicUsize::new(0),
            }
        }
    }

    impl ProductLookup for StubCatalog {
        fn products_by_ids(
            &self,
            ids: &[ProductId],
        ) -> impl Future<Output = Result<Vec<Product>, RepositoryError>> + Send {
            self.queries.fetch_add(1, Ordering::SeqCst);
            let found: Vec<Product> = self
                .products
                .iter()
                .filter(|p| ids.contains(&p.id))
                .cloned()
                .collect();
            async move { Ok(found) }
        }
    }

    fn new_session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_save_writes_added_lines() {
        let session = new_session();
        let mut cart_session = CartSession::load(session.clone(), "cart").await.unwrap();
        cart_session
            .cart()
            .add(&product(3, "Mug", "12.00"), 2, false);
        cart_session.save().await.unwrap();

        let stored = session.get::<Value>("cart").await.unwrap();
        assert_eq!(stored, Some(json!({"3": {"quantity": 2, "price": "12.00"}})));
    }

    #[tokio::test]
    async fn test_reload_sees_previous_request() {
        let session = new_session();

        let mut first = CartSession::load(session.clone(), "cart").await.unwrap();
        first.cart().add(&product(1, "Tea", "4.50"), 1, false);
        first.save().await.unwrap();

        let mut second = CartSession::load(session.clone(), "cart").await.unwrap();
        let mut cart = second.cart();
        cart.add(&product(1, "Tea", "4.50"), 2, false);
        assert_eq!(cart.count(), 3);
        assert_eq!(cart.total_price(), Decimal::new(1350, 2));
    }

    #[tokio::test]
    async fn test_unmodified_cart_is_not_written() {
        let session = new_session();
        session
            .insert("cart", json!({"1": {"quantity": 1, "price": "1.00"}}))
            .await
            .unwrap();

        let mut cart_session = CartSession::load(session.clone(), "cart").await.unwrap();
        assert_eq!(cart_session.cart().count(), 1);
        assert!(!cart_session.snapshot.is_modified());
        cart_session.save().await.unwrap();
    }

    #[tokio::test]
    async fn test_clear_removes_session_key() {
        let session = new_session();
        let mut cart_session = CartSession::load(session.clone(), "cart").await.unwrap();
        let mut cart = cart_session.cart();
        cart.add(&product(1, "Tea", "4.50"), 1, false);
        cart.clear();
        cart_session.save().await.unwrap();

        assert_eq!(session.get::<Value>("cart").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_cart_items_batches_and_keeps_missing_products() {
        let tea = product(1, "Tea", "9.99");
        let catalog = StubCatalog::new(vec![tea.clone()]);

        let mut snapshot = MemorySession::new();
        let mut cart = Cart::new(&mut snapshot);
        cart.add(&tea, 2, false);
        cart.add(&product(2, "Retired Mug", "5.00"), 1, false);

        let items = cart_items(&catalog, &cart).await.unwrap();
        assert_eq!(catalog.queries.load(Ordering::SeqCst), 1);
        assert_eq!(items.len(), 2);

        let ghost = items.iter().find(|i| i.product.is_none()).unwrap();
        assert_eq!(ghost.product_id, ProductId::new(2));

        let total: Decimal = items.iter().map(|i| i.total_price).sum();
        assert_eq!(total, cart.total_price());
        assert_eq!(total, Decimal::new(2498, 2));
    }

    #[tokio::test]
    async fn test_cart_items_skips_query_for_empty_cart() {
        let catalog = StubCatalog::new(Vec::new());
        let mut snapshot = MemorySession::new();
        let cart = Cart::new(&mut snapshot);

        let items = cart_items(&catalog, &cart).await.unwrap();
        assert!(items.is_empty());
        assert_eq!(catalog.queries.load(Ordering::SeqCst), 0);
    }
}
