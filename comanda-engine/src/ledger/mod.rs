//! Order ledger
//!
//! Owns order and line-item state: status-gated mutability, merge-on-add,
//! and incremental maintenance of the running total. Every mutation is
//! serialized per order through an async lock, persisted as a whole
//! aggregate, and announced on a broadcast channel only after the store
//! commit, so domain failures and event delivery can never leave a
//! half-applied order behind.

pub mod memory;
pub mod money;
pub mod store;

pub use memory::{MemoryCatalog, MemoryOrderStore};
pub use store::{Catalog, OrderStore, StoreError, StoreResult};

use crate::utils::time::now_millis;
use dashmap::DashMap;
use money::{line_total, round2};
use rust_decimal::Decimal;
use shared::error::{DomainError, DomainResult};
use shared::order::{
    ItemChanges, LineItemInput, MutationOutcome, Order, OrderEvent, OrderFilter, OrderItem,
    OrderStatus, OrderUpdate, ProductRef,
};
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast};

/// Event broadcast channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Maximum quantity per line item
const MAX_QUANTITY: i32 = 9999;

/// Maximum note length (item note and general note)
const MAX_NOTE_LEN: usize = 500;

// ── Input validation ────────────────────────────────────────────────

fn validate_quantity(quantity: i32) -> DomainResult<()> {
    if quantity <= 0 {
        return Err(DomainError::validation(format!(
            "quantity must be positive, got {quantity}"
        )));
    }
    if quantity > MAX_QUANTITY {
        return Err(DomainError::validation(format!(
            "quantity exceeds maximum allowed ({MAX_QUANTITY}), got {quantity}"
        )));
    }
    Ok(())
}

fn validate_note(note: Option<&str>, field: &str) -> DomainResult<()> {
    if let Some(note) = note
        && note.len() > MAX_NOTE_LEN
    {
        return Err(DomainError::validation(format!(
            "{field} is too long ({} chars, max {MAX_NOTE_LEN})",
            note.len()
        )));
    }
    Ok(())
}

fn validate_line_item(input: &LineItemInput) -> DomainResult<()> {
    validate_quantity(input.quantity)?;
    validate_note(input.note.as_deref(), "note")
}

fn validate_changes(changes: &ItemChanges) -> DomainResult<()> {
    if let Some(quantity) = changes.quantity {
        validate_quantity(quantity)?;
    }
    validate_note(changes.note.as_deref(), "note")
}

fn ensure_items_mutable(order: &Order) -> DomainResult<()> {
    if !order.status.allows_item_mutation() {
        return Err(DomainError::state_conflict(format!(
            "cannot modify items of an order with status {}",
            order.status
        )));
    }
    Ok(())
}

// ── Ledger ──────────────────────────────────────────────────────────

/// Order ledger service
pub struct OrderLedger {
    store: Arc<dyn OrderStore>,
    catalog: Arc<dyn Catalog>,
    /// Per-order mutation locks: at most one mutation per order at a time
    locks: DashMap<String, Arc<Mutex<()>>>,
    event_tx: broadcast::Sender<OrderEvent>,
}

impl OrderLedger {
    pub fn new(store: Arc<dyn OrderStore>, catalog: Arc<dyn Catalog>) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            store,
            catalog,
            locks: DashMap::new(),
            event_tx,
        }
    }

    /// Subscribe to post-commit order events
    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.event_tx.subscribe()
    }

    fn publish(&self, event: OrderEvent) {
        if self.event_tx.send(event).is_err() {
            tracing::debug!("order event dropped: no active receivers");
        }
    }

    fn lock_for(&self, order_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(order_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn resolve_product(&self, product_id: &str) -> DomainResult<ProductRef> {
        self.catalog
            .product(product_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Product {product_id}")))
    }

    async fn fetch_order(&self, order_id: &str) -> DomainResult<Order> {
        self.store
            .fetch(order_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Order {order_id}")))
    }

    /// Create an order with its initial line items, status OPEN
    ///
    /// Unit prices are captured from the catalog at this moment; duplicate
    /// (product, note) entries within the request are merged the same way
    /// `add_item` merges against existing lines.
    pub async fn create(
        &self,
        table_id: Option<String>,
        line_items: Vec<LineItemInput>,
        general_note: Option<String>,
        manual: bool,
    ) -> DomainResult<Order> {
        if line_items.is_empty() {
            return Err(DomainError::validation(
                "an order needs at least one line item",
            ));
        }
        for input in &line_items {
            validate_line_item(input)?;
        }
        validate_note(general_note.as_deref(), "general_note")?;

        if let Some(table) = table_id.as_deref()
            && !self.catalog.table_exists(table).await?
        {
            return Err(DomainError::not_found(format!("Table {table}")));
        }

        let now = now_millis();
        let mut order = Order {
            id: uuid::Uuid::new_v4().to_string(),
            table_id,
            status: OrderStatus::Open,
            total: Decimal::ZERO,
            general_note,
            manual,
            created_at: now,
            items: Vec::new(),
        };

        for input in line_items {
            match order.mergeable_item(&input.product_id, input.note.as_deref()) {
                Some(idx) => order.items[idx].quantity += input.quantity,
                None => {
                    let product = self.resolve_product(&input.product_id).await?;
                    order.items.push(OrderItem::new(
                        &order.id,
                        &product.id,
                        input.quantity,
                        product.price,
                        input.note,
                        now,
                    ));
                }
            }
        }
        order.total = round2(order.computed_total());

        self.store.insert(order.clone()).await?;
        tracing::info!(order_id = %order.id, total = %order.total, "order created");
        self.publish(OrderEvent::OrderCreated {
            order: order.clone(),
        });
        Ok(order)
    }

    /// Add a line item to an open order
    ///
    /// A line with the same product and the same note absorbs the new
    /// quantity instead of duplicating the pair; the total moves by
    /// `unit_price × added quantity` either way.
    pub async fn add_item(&self, order_id: &str, input: LineItemInput) -> DomainResult<OrderItem> {
        validate_line_item(&input)?;
        let lock = self.lock_for(order_id);
        let _guard = lock.lock().await;

        let mut order = self.fetch_order(order_id).await?;
        ensure_items_mutable(&order)?;

        let added_quantity = input.quantity;
        let item = match order.mergeable_item(&input.product_id, input.note.as_deref()) {
            Some(idx) => {
                let line = &mut order.items[idx];
                line.quantity += added_quantity;
                let delta = line_total(line.unit_price, added_quantity);
                order.total = round2(order.total + delta);
                order.items[idx].clone()
            }
            None => {
                let product = self.resolve_product(&input.product_id).await?;
                let item = OrderItem::new(
                    &order.id,
                    &product.id,
                    added_quantity,
                    product.price,
                    input.note,
                    now_millis(),
                );
                order.total = round2(order.total + item.line_total());
                order.items.push(item.clone());
                item
            }
        };

        self.store.update(order.clone()).await?;
        self.publish(OrderEvent::ItemAdded {
            order,
            item: item.clone(),
            quantity: added_quantity,
        });
        Ok(item)
    }

    /// Update a line item's quantity and/or note
    ///
    /// The total is recomputed from the old and new contributions, never
    /// from a stored delta.
    pub async fn update_item(&self, item_id: &str, changes: ItemChanges) -> DomainResult<OrderItem> {
        validate_changes(&changes)?;
        let owner = self
            .store
            .fetch_by_item(item_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Order item {item_id}")))?;
        let lock = self.lock_for(&owner.id);
        let _guard = lock.lock().await;

        // reload under the lock, the aggregate may have changed meanwhile
        let mut order = self.fetch_order(&owner.id).await?;
        ensure_items_mutable(&order)?;
        let idx = order
            .item_index(item_id)
            .ok_or_else(|| DomainError::not_found(format!("Order item {item_id}")))?;

        let old_contribution = order.items[idx].line_total();
        {
            let item = &mut order.items[idx];
            if let Some(quantity) = changes.quantity {
                item.quantity = quantity;
            }
            if let Some(note) = changes.note {
                item.note = Some(note);
            }
        }
        let new_contribution = order.items[idx].line_total();
        order.total = round2(order.total - old_contribution + new_contribution);

        let item = order.items[idx].clone();
        self.store.update(order.clone()).await?;
        self.publish(OrderEvent::ItemUpdated {
            order,
            item: item.clone(),
        });
        Ok(item)
    }

    /// Remove a line item, subtracting its contribution from the total
    ///
    /// Removing the last remaining item is rejected; the order must be
    /// deleted wholesale instead of emptied item-by-item.
    pub async fn remove_item(&self, item_id: &str) -> DomainResult<()> {
        let owner = self
            .store
            .fetch_by_item(item_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Order item {item_id}")))?;
        let lock = self.lock_for(&owner.id);
        let _guard = lock.lock().await;

        let mut order = self.fetch_order(&owner.id).await?;
        ensure_items_mutable(&order)?;
        let idx = order
            .item_index(item_id)
            .ok_or_else(|| DomainError::not_found(format!("Order item {item_id}")))?;

        if order.items.len() == 1 {
            return Err(DomainError::invariant(
                "cannot remove the last item of an order; delete the order instead",
            ));
        }

        let item = order.items.remove(idx);
        order.total = round2(order.total - item.line_total());

        self.store.update(order.clone()).await?;
        self.publish(OrderEvent::ItemRemoved {
            order,
            item_id: item.id,
        });
        Ok(())
    }

    /// Apply status/note/table changes, returning before and after
    /// snapshots so the caller can detect the status delta
    pub async fn transition_status(
        &self,
        order_id: &str,
        update: OrderUpdate,
    ) -> DomainResult<MutationOutcome> {
        validate_note(update.general_note.as_deref(), "general_note")?;
        let lock = self.lock_for(order_id);
        let _guard = lock.lock().await;

        let mut order = self.fetch_order(order_id).await?;
        let before = order.clone();

        if let Some(status) = update.status {
            if !before.status.can_transition_to(status) {
                return Err(DomainError::state_conflict(format!(
                    "status cannot change from {} to {}",
                    before.status, status
                )));
            }
            order.status = status;
        }
        if let Some(note) = update.general_note {
            order.general_note = Some(note);
        }
        if let Some(table_id) = update.table_id {
            if !self.catalog.table_exists(&table_id).await? {
                return Err(DomainError::not_found(format!("Table {table_id}")));
            }
            order.table_id = Some(table_id);
        }

        self.store.update(order.clone()).await?;
        if before.status != order.status {
            tracing::info!(
                order_id = %order.id,
                from = %before.status,
                to = %order.status,
                "order status changed"
            );
        }

        let outcome = MutationOutcome {
            before,
            after: order,
        };
        self.publish(OrderEvent::OrderUpdated {
            before: outcome.before.clone(),
            after: outcome.after.clone(),
        });
        Ok(outcome)
    }

    /// Delete an order and all of its items, permitted in any status
    pub async fn delete(&self, order_id: &str) -> DomainResult<()> {
        let lock = self.lock_for(order_id);
        let _guard = lock.lock().await;

        let order = self.fetch_order(order_id).await?;
        self.store.remove(order_id).await?;
        self.locks.remove(order_id);

        tracing::info!(order_id = %order.id, "order deleted");
        self.publish(OrderEvent::OrderDeleted { order });
        Ok(())
    }

    pub async fn get(&self, order_id: &str) -> DomainResult<Order> {
        self.fetch_order(order_id).await
    }

    /// Page of orders, newest first, with the unpaged match count
    pub async fn list(
        &self,
        filter: &OrderFilter,
        offset: usize,
        limit: usize,
    ) -> DomainResult<(Vec<Order>, usize)> {
        Ok(self.store.list(filter, offset, limit).await?)
    }
}
