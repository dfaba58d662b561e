//! Notification records, content variants, and merge rules

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Notification type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    WaiterCall,
    OrderItemsAdded,
    OrderFinalized,
}

impl NotificationType {
    /// Types whose events merge into one record within the aggregation window
    pub fn is_aggregable(&self) -> bool {
        matches!(self, Self::OrderItemsAdded)
    }

    /// Stable fragment used in KV keys
    pub fn as_key(&self) -> &'static str {
        match self {
            Self::WaiterCall => "waiter_call",
            Self::OrderItemsAdded => "order_items_added",
            Self::OrderFinalized => "order_finalized",
        }
    }
}

/// Payload fragment carried by one items-added event:
/// the product, quantity, and note just added, not the full order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AddedItem {
    pub product_id: String,
    pub quantity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Type-specific notification content
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationContent {
    WaiterCall {
        table_id: String,
        message: String,
    },
    ItemsAdded {
        order_id: String,
        table_id: String,
        items: Vec<AddedItem>,
        message: String,
    },
    OrderFinalized {
        order_id: String,
        table_id: String,
        total: Decimal,
        message: String,
    },
}

/// Ephemeral KV entry marking the open aggregation window for a
/// (type, entity) pair; expires after the window duration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationMarker {
    pub notification_id: String,
    pub last_update: i64,
}

/// Notification record as stored in the KV store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    /// The order or table the notification concerns
    pub entity_id: String,
    pub content: NotificationContent,
    /// Merged payload fragments, present only for aggregated records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragments: Option<Vec<NotificationContent>>,
    /// Fragment count, present only for aggregated records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    pub created_at: i64,
    pub updated_at: i64,
    pub read: bool,
}

impl Notification {
    /// Fresh notification; aggregated records start with a one-entry
    /// fragment list and count 1
    pub fn new(
        kind: NotificationType,
        entity_id: &str,
        content: NotificationContent,
        aggregated: bool,
        now: i64,
    ) -> Self {
        let fragments = aggregated.then(|| vec![content.clone()]);
        let count = aggregated.then_some(1);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            entity_id: entity_id.to_string(),
            content,
            fragments,
            count,
            created_at: now,
            updated_at: now,
            read: false,
        }
    }

    /// Merge one more event into this record: append the fragment, bump
    /// the count, refresh `updated_at`, and re-derive the summary content
    /// per the type's merge rule. The identifier never changes.
    pub fn absorb(&mut self, content: NotificationContent, now: i64) {
        let fragments = self.fragments.get_or_insert_with(Vec::new);
        fragments.push(content);
        let count = fragments.len() as u32;
        self.count = Some(count);
        self.updated_at = now;

        if self.kind == NotificationType::OrderItemsAdded {
            self.content = Self::merged_items_summary(fragments, count)
                .unwrap_or_else(|| self.content.clone());
        }
    }

    /// Summary for a merged items-added record: all fragments' items
    /// flattened, message regenerated with the event count
    fn merged_items_summary(
        fragments: &[NotificationContent],
        count: u32,
    ) -> Option<NotificationContent> {
        let (order_id, table_id) = fragments.iter().find_map(|fragment| match fragment {
            NotificationContent::ItemsAdded {
                order_id, table_id, ..
            } => Some((order_id.clone(), table_id.clone())),
            _ => None,
        })?;

        let items: Vec<AddedItem> = fragments
            .iter()
            .filter_map(|fragment| match fragment {
                NotificationContent::ItemsAdded { items, .. } => Some(items.clone()),
                _ => None,
            })
            .flatten()
            .collect();

        Some(NotificationContent::ItemsAdded {
            message: format!(
                "{} items added to the order for table {}",
                count, table_id
            ),
            order_id,
            table_id,
            items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items_added_content(product_id: &str) -> NotificationContent {
        NotificationContent::ItemsAdded {
            order_id: "order-1".to_string(),
            table_id: "T3".to_string(),
            items: vec![AddedItem {
                product_id: product_id.to_string(),
                quantity: 1,
                note: None,
            }],
            message: "New items added to the order for table T3".to_string(),
        }
    }

    #[test]
    fn test_new_aggregated_starts_with_one_fragment() {
        let n = Notification::new(
            NotificationType::OrderItemsAdded,
            "order-1",
            items_added_content("prod-a"),
            true,
            100,
        );
        assert_eq!(n.count, Some(1));
        assert_eq!(n.fragments.as_ref().unwrap().len(), 1);
        assert!(!n.read);
    }

    #[test]
    fn test_new_plain_has_no_aggregation_fields() {
        let n = Notification::new(
            NotificationType::WaiterCall,
            "T3",
            NotificationContent::WaiterCall {
                table_id: "T3".to_string(),
                message: "Table T3 requested a waiter".to_string(),
            },
            false,
            100,
        );
        assert!(n.fragments.is_none());
        assert!(n.count.is_none());
        let json = serde_json::to_string(&n).unwrap();
        assert!(!json.contains("fragments"));
        assert!(!json.contains("count"));
    }

    #[test]
    fn test_absorb_merges_and_rewrites_summary() {
        let mut n = Notification::new(
            NotificationType::OrderItemsAdded,
            "order-1",
            items_added_content("prod-a"),
            true,
            100,
        );
        n.absorb(items_added_content("prod-b"), 105);

        assert_eq!(n.count, Some(2));
        assert_eq!(n.fragments.as_ref().unwrap().len(), 2);
        assert_eq!(n.updated_at, 105);
        assert_eq!(n.created_at, 100);

        match &n.content {
            NotificationContent::ItemsAdded { items, message, .. } => {
                assert_eq!(items.len(), 2);
                assert_eq!(message, "2 items added to the order for table T3");
            }
            other => panic!("unexpected content: {:?}", other),
        }
    }

    #[test]
    fn test_absorb_keeps_identifier() {
        let mut n = Notification::new(
            NotificationType::OrderItemsAdded,
            "order-1",
            items_added_content("prod-a"),
            true,
            100,
        );
        let id = n.id.clone();
        n.absorb(items_added_content("prod-b"), 105);
        n.absorb(items_added_content("prod-c"), 107);
        assert_eq!(n.id, id);
        assert_eq!(n.count, Some(3));
    }

    #[test]
    fn test_stored_form_round_trips() {
        let n = Notification::new(
            NotificationType::OrderItemsAdded,
            "order-1",
            items_added_content("prod-a"),
            true,
            100,
        );
        let json = serde_json::to_string(&n).unwrap();
        assert!(json.contains("\"type\":\"ORDER_ITEMS_ADDED\""));
        let back: Notification = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, n.id);
        assert_eq!(back.count, Some(1));
    }
}
