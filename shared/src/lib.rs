//! Shared types for the Comanda order backend
//!
//! Common types used across the engine and any front-of-house crates:
//! the domain error taxonomy, order/line-item types, and notification
//! types with their merge rules.

pub mod error;
pub mod notification;
pub mod order;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use error::{DomainError, DomainResult};
pub use notification::{AddedItem, Notification, NotificationContent, NotificationType};
pub use order::{MutationOutcome, Order, OrderEvent, OrderItem, OrderStatus};
