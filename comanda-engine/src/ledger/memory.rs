//! In-memory collaborators for tests, development, and demos

use super::store::{Catalog, OrderStore, StoreResult};
use async_trait::async_trait;
use dashmap::DashMap;
use rust_decimal::Decimal;
use shared::order::{Order, OrderFilter, ProductRef};
use std::sync::atomic::{AtomicU64, Ordering};

/// DashMap-backed [`OrderStore`]
///
/// Aggregates are replaced whole, so there is no partial state to
/// protect; an insertion sequence keeps listing order stable when
/// creation timestamps collide.
#[derive(Default)]
pub struct MemoryOrderStore {
    orders: DashMap<String, (u64, Order)>,
    seq: AtomicU64,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn insert(&self, order: Order) -> StoreResult<()> {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        self.orders.insert(order.id.clone(), (seq, order));
        Ok(())
    }

    async fn fetch(&self, order_id: &str) -> StoreResult<Option<Order>> {
        Ok(self.orders.get(order_id).map(|entry| entry.1.clone()))
    }

    async fn fetch_by_item(&self, item_id: &str) -> StoreResult<Option<Order>> {
        Ok(self
            .orders
            .iter()
            .find(|entry| entry.1.items.iter().any(|item| item.id == item_id))
            .map(|entry| entry.1.clone()))
    }

    async fn update(&self, order: Order) -> StoreResult<()> {
        if let Some(mut entry) = self.orders.get_mut(&order.id) {
            entry.1 = order;
        }
        Ok(())
    }

    async fn remove(&self, order_id: &str) -> StoreResult<bool> {
        Ok(self.orders.remove(order_id).is_some())
    }

    async fn list(
        &self,
        filter: &OrderFilter,
        offset: usize,
        limit: usize,
    ) -> StoreResult<(Vec<Order>, usize)> {
        let mut matched: Vec<(u64, Order)> = self
            .orders
            .iter()
            .filter(|entry| {
                let order = &entry.1;
                filter.status.is_none_or(|status| order.status == status)
                    && filter
                        .table_id
                        .as_deref()
                        .is_none_or(|table| order.table_id.as_deref() == Some(table))
            })
            .map(|entry| entry.value().clone())
            .collect();

        let total = matched.len();
        // newest first; insertion sequence breaks created_at ties
        matched.sort_by(|a, b| (b.1.created_at, b.0).cmp(&(a.1.created_at, a.0)));
        let page = matched
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|(_, order)| order)
            .collect();
        Ok((page, total))
    }
}

/// DashMap-backed [`Catalog`]
#[derive(Default)]
pub struct MemoryCatalog {
    products: DashMap<String, ProductRef>,
    tables: DashMap<String, ()>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_product(&self, id: &str, name: &str, price: Decimal) {
        self.products.insert(
            id.to_string(),
            ProductRef {
                id: id.to_string(),
                name: name.to_string(),
                price,
            },
        );
    }

    /// Change a product's menu price; existing line items keep the price
    /// captured when they were added
    pub fn set_price(&self, id: &str, price: Decimal) {
        if let Some(mut product) = self.products.get_mut(id) {
            product.price = price;
        }
    }

    pub fn add_table(&self, id: &str) {
        self.tables.insert(id.to_string(), ());
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn product(&self, product_id: &str) -> StoreResult<Option<ProductRef>> {
        Ok(self.products.get(product_id).map(|p| p.clone()))
    }

    async fn table_exists(&self, table_id: &str) -> StoreResult<bool> {
        Ok(self.tables.contains_key(table_id))
    }
}
