//! Cart line types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::ProductId;

/// Something the cart can hold: a catalog entry with an id and a current price.
pub trait CatalogItem {
    /// Catalog id of the product.
    fn product_id(&self) -> ProductId;

    /// Current unit price. Captured once when a cart line is created.
    fn unit_price(&self) -> Decimal;
}

/// One product's quantity and snapshotted unit price within a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    product_id: ProductId,
    quantity: u32,
    unit_price: Decimal,
}

impl CartLine {
    /// Create an empty line (quantity 0) priced at `unit_price`.
    #[must_use]
    pub const fn new(product_id: ProductId, unit_price: Decimal) -> Self {
        Self {
            product_id,
            quantity: 0,
            unit_price,
        }
    }

    /// Product this line refers to.
    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.product_id
    }

    /// Number of units.
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Price per unit as captured when the line was created.
    #[must_use]
    pub const fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    /// `unit_price × quantity`.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    pub(crate) const fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
    }

    pub(crate) const fn increase_quantity(&mut self, quantity: u32) {
        self.quantity = self.quantity.saturating_add(quantity);
    }

    /// Encode as the session record `{"quantity": n, "price": "d.dd"}`.
    pub(crate) fn to_record(&self) -> Value {
        let mut record = Map::with_capacity(2);
        record.insert("quantity".to_owned(), Value::from(self.quantity));
        record.insert("price".to_owned(), Value::from(self.unit_price.to_string()));
        Value::Object(record)
    }

    pub(crate) const fn from_record(product_id: ProductId, record: &StoredLine) -> Self {
        Self {
            product_id,
            quantity: record.quantity,
            unit_price: record.price,
        }
    }
}

/// Session representation of a line. Prices travel as decimal strings.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct StoredLine {
    pub(crate) quantity: u32,
    #[serde(with = "rust_decimal::serde::str")]
    pub(crate) price: Decimal,
}

/// A cart line joined with live catalog data.
///
/// `product` is `None` when the catalog no longer has the product; the line
/// is still priced from its snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedLine<P> {
    /// Product id the line was stored under.
    pub product_id: ProductId,
    /// Live catalog record, if it still exists.
    pub product: Option<P>,
    /// Number of units.
    pub quantity: u32,
    /// Snapshotted unit price.
    pub unit_price: Decimal,
    /// `unit_price × quantity`.
    pub total_price: Decimal,
}

impl<P> EnrichedLine<P> {
    pub(crate) fn new(line: &CartLine, product: Option<P>) -> Self {
        Self {
            product_id: line.product_id,
            product,
            quantity: line.quantity,
            unit_price: line.unit_price,
            total_price: line.total_price(),
        }
    }
}
