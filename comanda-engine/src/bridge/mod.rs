//! Order event bridge
//!
//! Post-commit observer coupling the ledger to the notification
//! aggregator. It inspects before/after order state and decides what to
//! emit; it never touches the ledger, and an emission failure can never
//! fail or roll back the order mutation it reacts to.

use crate::notify::NotificationAggregator;
use shared::notification::AddedItem;
use shared::order::{Order, OrderEvent, OrderItem, OrderStatus};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Bridge from ledger events to customer-facing notifications
pub struct OrderEventBridge {
    notifier: Arc<NotificationAggregator>,
}

impl OrderEventBridge {
    pub fn new(notifier: Arc<NotificationAggregator>) -> Self {
        Self { notifier }
    }

    /// Drain ledger events on a background task until the ledger (and
    /// with it the channel) goes away
    pub fn spawn(self: Arc<Self>, mut rx: broadcast::Receiver<OrderEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => self.handle(&event).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            skipped,
                            "order event stream lagged, notifications may be missing"
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Inspect one post-commit event and emit whatever it warrants
    pub async fn handle(&self, event: &OrderEvent) {
        match event {
            OrderEvent::ItemAdded {
                order,
                item,
                quantity,
            } => self.on_item_added(order, item, *quantity).await,
            OrderEvent::OrderUpdated { before, after } => {
                self.on_order_updated(before, after).await
            }
            _ => {}
        }
    }

    /// Items-added notification: only for non-manual orders with a table,
    /// carrying just the added (product, quantity, note), aggregated
    async fn on_item_added(&self, order: &Order, item: &OrderItem, quantity: i32) {
        if order.manual {
            return;
        }
        let Some(table_id) = order.table_id.as_deref() else {
            return;
        };
        let added = AddedItem {
            product_id: item.product_id.clone(),
            quantity,
            note: item.note.clone(),
        };
        if let Err(err) = self
            .notifier
            .order_items_added(&order.id, table_id, added)
            .await
        {
            tracing::warn!(
                order_id = %order.id,
                error = %err,
                "failed to emit items-added notification"
            );
        }
    }

    /// Order-finalized notification: fires on the edge into FINALIZED for
    /// non-manual orders with a table, never aggregated
    async fn on_order_updated(&self, before: &Order, after: &Order) {
        if after.status != OrderStatus::Finalized || before.status == OrderStatus::Finalized {
            return;
        }
        if after.manual {
            return;
        }
        let Some(table_id) = after.table_id.as_deref() else {
            return;
        };

        // recompute from the items; the stored running total may have drifted
        let total = after.computed_total();
        if let Err(err) = self.notifier.order_finalized(&after.id, table_id, total).await {
            tracing::warn!(
                order_id = %after.id,
                error = %err,
                "failed to emit order-finalized notification"
            );
        }
    }
}
