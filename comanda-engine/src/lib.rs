//! Comanda engine - order ledger and notification aggregation
//!
//! The engine owns the two subsystems where concurrent mutation and
//! derived-state consistency matter:
//!
//! - [`ledger`]: orders and line items with incremental running totals,
//!   merge-on-add, and status-gated mutability
//! - [`notify`]: time-windowed notification aggregation over a TTL
//!   key-value store
//! - [`bridge`]: the post-commit observer coupling the two
//!
//! Menu/table records, authentication, and HTTP routing live outside this
//! crate; the ledger reaches them through the [`ledger::store`] traits.

pub mod bridge;
pub mod core;
pub mod kv;
pub mod ledger;
pub mod notify;
pub mod utils;

pub use crate::core::{AppState, Config};
pub use crate::ledger::OrderLedger;
pub use crate::notify::NotificationAggregator;
