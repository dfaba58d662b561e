//! Order domain types
//!
//! - Status: the order lifecycle and its transition rules
//! - Types: the order aggregate, line items, and mutation inputs
//! - Events: immutable facts published after each committed mutation

pub mod event;
pub mod status;
pub mod types;

// Re-exports
pub use event::{MutationOutcome, OrderEvent};
pub use status::OrderStatus;
pub use types::{ItemChanges, LineItemInput, Order, OrderFilter, OrderItem, OrderUpdate, ProductRef};
