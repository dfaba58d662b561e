//! Order mutation events
//!
//! Published by the ledger after a mutation commits, never before.
//! Events carry full before/after snapshots so observers can decide what
//! to do without reading the store again.

use super::types::{Order, OrderItem};
use serde::{Deserialize, Serialize};

/// Before/after snapshot pair returned by status transitions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationOutcome {
    pub before: Order,
    pub after: Order,
}

/// Post-commit order event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderEvent {
    OrderCreated {
        order: Order,
    },
    /// `quantity` is the amount added by this operation; on a merge the
    /// item itself carries the cumulative quantity.
    ItemAdded {
        order: Order,
        item: OrderItem,
        quantity: i32,
    },
    ItemUpdated {
        order: Order,
        item: OrderItem,
    },
    ItemRemoved {
        order: Order,
        item_id: String,
    },
    OrderUpdated {
        before: Order,
        after: Order,
    },
    OrderDeleted {
        order: Order,
    },
}

impl OrderEvent {
    /// Identifier of the order the event concerns
    pub fn order_id(&self) -> &str {
        match self {
            Self::OrderCreated { order }
            | Self::ItemAdded { order, .. }
            | Self::ItemUpdated { order, .. }
            | Self::ItemRemoved { order, .. }
            | Self::OrderDeleted { order } => &order.id,
            Self::OrderUpdated { after, .. } => &after.id,
        }
    }
}
