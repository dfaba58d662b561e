//! Collaborator interfaces for the order ledger
//!
//! The relational store and the menu catalog live outside this crate;
//! the ledger only sees these traits. `update` replaces the whole
//! aggregate atomically, which is what keeps ledger mutations free of
//! partial state.

use async_trait::async_trait;
use shared::order::{Order, OrderFilter, ProductRef};
use thiserror::Error;

/// Backing-store failures (infra-class; never encodes domain outcomes)
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),

    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for shared::error::DomainError {
    fn from(err: StoreError) -> Self {
        Self::Infra(err.to_string())
    }
}

/// Persistence for order aggregates
///
/// Absence is expressed through `Option`, not errors; the ledger decides
/// what absence means for each operation.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a new aggregate
    async fn insert(&self, order: Order) -> StoreResult<()>;

    /// Load an aggregate by order id
    async fn fetch(&self, order_id: &str) -> StoreResult<Option<Order>>;

    /// Load the aggregate owning the given line item
    async fn fetch_by_item(&self, item_id: &str) -> StoreResult<Option<Order>>;

    /// Replace an aggregate atomically (all-or-nothing)
    async fn update(&self, order: Order) -> StoreResult<()>;

    /// Delete an aggregate and its items; true when it existed
    async fn remove(&self, order_id: &str) -> StoreResult<bool>;

    /// Page of orders, newest first, with the unpaged match count
    async fn list(
        &self,
        filter: &OrderFilter,
        offset: usize,
        limit: usize,
    ) -> StoreResult<(Vec<Order>, usize)>;
}

/// Read access to menu products and dining tables
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Product with its current menu price
    async fn product(&self, product_id: &str) -> StoreResult<Option<ProductRef>>;

    /// Whether a dining table exists
    async fn table_exists(&self, table_id: &str) -> StoreResult<bool>;
}
