//! Notification aggregator
//!
//! Creates, merges, lists, and retires notification records over the KV
//! store. Records are keyed `notification:{id}`; the unread index is a
//! score-ordered set keyed by creation time; an ephemeral marker keyed
//! `notification:agg:{type}:{entity}` points at the currently-open record
//! for that pair and slides forward with every contribution.
//!
//! The merge path is a plain read-modify-write without compare-and-swap:
//! two concurrent creates for the same (type, entity) inside one window
//! can lose an update. Aggregation counts are best-effort, not a tally.

use crate::kv::{KvError, KvStore};
use crate::utils::time::now_millis;
use rust_decimal::Decimal;
use shared::notification::{
    AddedItem, AggregationMarker, Notification, NotificationContent, NotificationType,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Key of the unread notification index
const UNREAD_INDEX_KEY: &str = "notifications:unread";

/// Aggregator errors (infra-class)
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error(transparent)]
    Kv(#[from] KvError),

    #[error("notification serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type NotifyResult<T> = Result<T, NotifyError>;

/// Notification service over a TTL key-value store
pub struct NotificationAggregator {
    kv: Arc<dyn KvStore>,
    /// Retention TTL for notification records and the unread index
    retention: Duration,
    /// Aggregation window for merge-eligible events
    window: Duration,
}

impl NotificationAggregator {
    pub fn new(kv: Arc<dyn KvStore>, retention: Duration, window: Duration) -> Self {
        Self {
            kv,
            retention,
            window,
        }
    }

    fn notification_key(id: &str) -> String {
        format!("notification:{id}")
    }

    fn marker_key(kind: NotificationType, entity_id: &str) -> String {
        format!("notification:agg:{}:{}", kind.as_key(), entity_id)
    }

    /// Create a notification, merging into the open record for
    /// (kind, entity) when `aggregate` is set and the window is alive
    ///
    /// Merged records keep their identifier and their unread-index entry;
    /// only fresh records are added to the index.
    pub async fn create(
        &self,
        kind: NotificationType,
        entity_id: &str,
        content: NotificationContent,
        ttl: Option<Duration>,
        aggregate: bool,
    ) -> NotifyResult<Notification> {
        let now = now_millis();
        let retention = ttl.unwrap_or(self.retention);

        if aggregate
            && let Some(mut existing) = self.open_notification(kind, entity_id).await?
        {
            existing.absorb(content, now);
            self.store_notification(&existing, retention).await?;
            self.write_marker(kind, entity_id, &existing.id, now).await?;
            tracing::debug!(
                notification_id = %existing.id,
                count = existing.count.unwrap_or(0),
                "notification merged into open window"
            );
            return Ok(existing);
        }

        let notification = Notification::new(kind, entity_id, content, aggregate, now);
        self.store_notification(&notification, retention).await?;
        if aggregate {
            self.write_marker(kind, entity_id, &notification.id, now)
                .await?;
        }
        self.kv.zadd(UNREAD_INDEX_KEY, &notification.id, now).await?;
        self.kv.expire(UNREAD_INDEX_KEY, retention).await?;
        Ok(notification)
    }

    /// Open notification for (kind, entity): the marker must be alive and
    /// the record it points at must still exist
    async fn open_notification(
        &self,
        kind: NotificationType,
        entity_id: &str,
    ) -> NotifyResult<Option<Notification>> {
        let Some(raw) = self.kv.get(&Self::marker_key(kind, entity_id)).await? else {
            return Ok(None);
        };
        let marker: AggregationMarker = serde_json::from_str(&raw)?;
        self.get(&marker.notification_id).await
    }

    async fn store_notification(
        &self,
        notification: &Notification,
        ttl: Duration,
    ) -> NotifyResult<()> {
        let raw = serde_json::to_string(notification)?;
        self.kv
            .set(&Self::notification_key(&notification.id), &raw, Some(ttl))
            .await?;
        Ok(())
    }

    /// (Re)write the window marker so the window slides forward
    async fn write_marker(
        &self,
        kind: NotificationType,
        entity_id: &str,
        notification_id: &str,
        now: i64,
    ) -> NotifyResult<()> {
        let marker = AggregationMarker {
            notification_id: notification_id.to_string(),
            last_update: now,
        };
        self.kv
            .set(
                &Self::marker_key(kind, entity_id),
                &serde_json::to_string(&marker)?,
                Some(self.window),
            )
            .await?;
        Ok(())
    }

    /// Fetch a notification by id, read or unread
    pub async fn get(&self, id: &str) -> NotifyResult<Option<Notification>> {
        match self.kv.get(&Self::notification_key(id)).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Unread notifications, newest first; identifiers whose records
    /// already expired are silently skipped
    pub async fn list_unread(&self, limit: usize) -> NotifyResult<Vec<Notification>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let ids = self
            .kv
            .zrevrange(UNREAD_INDEX_KEY, 0, limit as isize - 1)
            .await?;
        let mut notifications = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(notification) = self.get(&id).await? {
                notifications.push(notification);
            }
        }
        Ok(notifications)
    }

    /// Mark a notification read and drop it from the unread index;
    /// false when the record does not exist
    pub async fn mark_read(&self, id: &str) -> NotifyResult<bool> {
        let Some(mut notification) = self.get(id).await? else {
            return Ok(false);
        };
        notification.read = true;
        self.store_notification(&notification, self.retention).await?;
        self.kv.zrem(UNREAD_INDEX_KEY, id).await?;
        Ok(true)
    }

    /// Remove a notification and its unread-index entry;
    /// false when the record did not exist
    pub async fn delete(&self, id: &str) -> NotifyResult<bool> {
        let removed = self.kv.delete(&Self::notification_key(id)).await?;
        if removed {
            self.kv.zrem(UNREAD_INDEX_KEY, id).await?;
        }
        Ok(removed)
    }

    // ── Convenience constructors ────────────────────────────────────

    /// A table requested a waiter; never aggregated
    pub async fn waiter_call(&self, table_id: &str) -> NotifyResult<Notification> {
        let content = NotificationContent::WaiterCall {
            table_id: table_id.to_string(),
            message: format!("Table {table_id} requested a waiter"),
        };
        self.create(NotificationType::WaiterCall, table_id, content, None, false)
            .await
    }

    /// An item was added to a table's order; aggregated per order
    pub async fn order_items_added(
        &self,
        order_id: &str,
        table_id: &str,
        item: AddedItem,
    ) -> NotifyResult<Notification> {
        let content = NotificationContent::ItemsAdded {
            order_id: order_id.to_string(),
            table_id: table_id.to_string(),
            items: vec![item],
            message: format!("New items added to the order for table {table_id}"),
        };
        self.create(
            NotificationType::OrderItemsAdded,
            order_id,
            content,
            None,
            true,
        )
        .await
    }

    /// A table's order was finalized at the given total; never aggregated
    pub async fn order_finalized(
        &self,
        order_id: &str,
        table_id: &str,
        total: Decimal,
    ) -> NotifyResult<Notification> {
        let content = NotificationContent::OrderFinalized {
            order_id: order_id.to_string(),
            table_id: table_id.to_string(),
            total,
            message: format!("Order for table {table_id} finalized at {total}"),
        };
        self.create(
            NotificationType::OrderFinalized,
            order_id,
            content,
            None,
            false,
        )
        .await
    }
}
