//! Order aggregate, line items, and mutation inputs
//!
//! The order owns its items: the whole aggregate is loaded and persisted
//! as a unit, and deleting the order deletes the items with it. The
//! running total is maintained incrementally on every committed mutation,
//! never derived lazily.

use super::status::OrderStatus;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Product reference resolved from the menu catalog
///
/// Carries the product's current price; the ledger captures it into the
/// line item at add-time, after which the line price never moves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRef {
    pub id: String,
    pub name: String,
    pub price: Decimal,
}

/// One (product, note) entry on an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    /// Always positive
    pub quantity: i32,
    /// Captured from the product at add-time, immutable thereafter
    pub unit_price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: i64,
}

impl OrderItem {
    pub fn new(
        order_id: &str,
        product_id: &str,
        quantity: i32,
        unit_price: Decimal,
        note: Option<String>,
        created_at: i64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            product_id: product_id.to_string(),
            quantity,
            unit_price,
            note,
            created_at,
        }
    }

    /// Contribution of this line to the order total
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    /// Note equality for merge-on-add: both-absent counts as equal,
    /// a present note must match exactly.
    pub fn note_matches(&self, note: Option<&str>) -> bool {
        self.note.as_deref() == note
    }
}

/// Order aggregate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: String,
    /// None for walk-in/manual orders without a table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_id: Option<String>,
    pub status: OrderStatus,
    /// Running total; equals the sum over items of quantity × unit_price
    /// after every committed mutation
    pub total: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub general_note: Option<String>,
    /// Entered directly by staff; exempt from the customer-facing
    /// notification flow
    pub manual: bool,
    pub created_at: i64,
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Total recomputed independently from the current items
    pub fn computed_total(&self) -> Decimal {
        self.items.iter().map(OrderItem::line_total).sum()
    }

    /// Find an existing line the given (product, note) pair merges into
    pub fn mergeable_item(&self, product_id: &str, note: Option<&str>) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.product_id == product_id && item.note_matches(note))
    }

    pub fn item(&self, item_id: &str) -> Option<&OrderItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    pub fn item_index(&self, item_id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id == item_id)
    }
}

/// Requested line item for order creation and item addition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItemInput {
    pub product_id: String,
    pub quantity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl LineItemInput {
    pub fn new(product_id: &str, quantity: i32) -> Self {
        Self {
            product_id: product_id.to_string(),
            quantity,
            note: None,
        }
    }

    pub fn with_note(product_id: &str, quantity: i32, note: &str) -> Self {
        Self {
            product_id: product_id.to_string(),
            quantity,
            note: Some(note.to_string()),
        }
    }
}

/// Item changes for `update_item` (None = no change)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ItemChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Field changes for `transition_status` (None = no change)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OrderUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub general_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_id: Option<String>,
}

/// Listing filter for orders
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub table_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn sample_order() -> Order {
        let mut order = Order {
            id: "order-1".to_string(),
            table_id: Some("T1".to_string()),
            status: OrderStatus::Open,
            total: Decimal::ZERO,
            general_note: None,
            manual: false,
            created_at: 0,
            items: vec![],
        };
        order.items.push(OrderItem::new(
            "order-1",
            "prod-a",
            2,
            dec("10.00"),
            None,
            0,
        ));
        order.items.push(OrderItem::new(
            "order-1",
            "prod-b",
            1,
            dec("5.00"),
            Some("no onions".to_string()),
            0,
        ));
        order.total = order.computed_total();
        order
    }

    #[test]
    fn test_computed_total() {
        let order = sample_order();
        assert_eq!(order.computed_total(), dec("25.00"));
        assert_eq!(order.total, order.computed_total());
    }

    #[test]
    fn test_mergeable_item_note_rules() {
        let order = sample_order();
        // both notes absent → merge target found
        assert_eq!(order.mergeable_item("prod-a", None), Some(0));
        // present note must match exactly
        assert_eq!(order.mergeable_item("prod-b", Some("no onions")), Some(1));
        assert_eq!(order.mergeable_item("prod-b", Some("extra onions")), None);
        // absent vs present never merges
        assert_eq!(order.mergeable_item("prod-b", None), None);
        assert_eq!(order.mergeable_item("prod-a", Some("rare")), None);
    }

    #[test]
    fn test_line_total() {
        let item = OrderItem::new("o", "p", 3, dec("7.50"), None, 0);
        assert_eq!(item.line_total(), dec("22.50"));
    }
}
