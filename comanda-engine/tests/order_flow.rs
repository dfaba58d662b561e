//! End-to-end flows: ledger mutations driving notifications through the
//! event bridge, against in-memory collaborators.

use comanda_engine::bridge::OrderEventBridge;
use comanda_engine::kv::MemoryKv;
use comanda_engine::ledger::{MemoryCatalog, MemoryOrderStore};
use comanda_engine::notify::NotificationAggregator;
use comanda_engine::OrderLedger;
use rust_decimal::Decimal;
use shared::error::DomainError;
use shared::notification::{NotificationContent, NotificationType};
use shared::order::{LineItemInput, OrderEvent, OrderStatus, OrderUpdate};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

const RETENTION: Duration = Duration::from_secs(24 * 60 * 60);
const WINDOW: Duration = Duration::from_secs(10);

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

struct Fixture {
    ledger: OrderLedger,
    bridge: OrderEventBridge,
    notifier: Arc<NotificationAggregator>,
    kv: Arc<MemoryKv>,
    events: broadcast::Receiver<OrderEvent>,
}

/// Ledger + aggregator + bridge over in-memory stores; products
/// A (10.00) and B (5.00), table T1. Events are pumped into the bridge
/// by hand so the tests stay deterministic.
fn setup() -> Fixture {
    let catalog = Arc::new(MemoryCatalog::new());
    catalog.add_product("prod-a", "Feijoada", dec("10.00"));
    catalog.add_product("prod-b", "Caipirinha", dec("5.00"));
    catalog.add_table("T1");

    let ledger = OrderLedger::new(Arc::new(MemoryOrderStore::new()), catalog);
    let events = ledger.subscribe();

    let kv = Arc::new(MemoryKv::new());
    let notifier = Arc::new(NotificationAggregator::new(kv.clone(), RETENTION, WINDOW));
    let bridge = OrderEventBridge::new(notifier.clone());

    Fixture {
        ledger,
        bridge,
        notifier,
        kv,
        events,
    }
}

impl Fixture {
    /// Feed every pending ledger event through the bridge
    async fn pump(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.bridge.handle(&event).await;
        }
    }
}

#[tokio::test]
async fn test_running_total_scenario() {
    let fx = setup();

    // 2× A (10.00) + 1× B (5.00)
    let order = fx
        .ledger
        .create(
            Some("T1".to_string()),
            vec![
                LineItemInput::new("prod-a", 2),
                LineItemInput::new("prod-b", 1),
            ],
            None,
            false,
        )
        .await
        .unwrap();
    assert_eq!(order.total, dec("25.00"));

    // +1× A with no note merges into the existing line
    let item = fx
        .ledger
        .add_item(&order.id, LineItemInput::new("prod-a", 1))
        .await
        .unwrap();
    assert_eq!(item.quantity, 3);
    let order = fx.ledger.get(&order.id).await.unwrap();
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.total, dec("35.00"));

    // removing B's line
    let b_id = order
        .items
        .iter()
        .find(|item| item.product_id == "prod-b")
        .unwrap()
        .id
        .clone();
    fx.ledger.remove_item(&b_id).await.unwrap();
    let order = fx.ledger.get(&order.id).await.unwrap();
    assert_eq!(order.total, dec("30.00"));
    assert_eq!(order.items.len(), 1);

    // the last item cannot be removed
    let last_id = order.items[0].id.clone();
    let err = fx.ledger.remove_item(&last_id).await.unwrap_err();
    assert!(matches!(err, DomainError::InvariantViolation(_)));
    let order = fx.ledger.get(&order.id).await.unwrap();
    assert_eq!(order.total, dec("30.00"));
    assert_eq!(order.total, order.computed_total());
}

#[tokio::test]
async fn test_items_added_aggregation_window() {
    let mut fx = setup();
    let order = fx
        .ledger
        .create(
            Some("T1".to_string()),
            vec![LineItemInput::new("prod-a", 1)],
            None,
            false,
        )
        .await
        .unwrap();

    // three additions in quick succession aggregate into one record
    for _ in 0..3 {
        fx.ledger
            .add_item(&order.id, LineItemInput::new("prod-b", 1))
            .await
            .unwrap();
        fx.pump().await;
        fx.kv.advance(Duration::from_secs(2));
    }

    let unread = fx.notifier.list_unread(50).await.unwrap();
    assert_eq!(unread.len(), 1);
    assert_eq!(unread[0].kind, NotificationType::OrderItemsAdded);
    assert_eq!(unread[0].count, Some(3));
    match &unread[0].content {
        NotificationContent::ItemsAdded { items, message, .. } => {
            assert_eq!(items.len(), 3);
            assert_eq!(message, "3 items added to the order for table T1");
        }
        other => panic!("unexpected content: {:?}", other),
    }

    // a fourth addition after the window elapsed starts a new record
    fx.kv.advance(Duration::from_secs(11));
    fx.ledger
        .add_item(&order.id, LineItemInput::new("prod-a", 1))
        .await
        .unwrap();
    fx.pump().await;

    let unread = fx.notifier.list_unread(50).await.unwrap();
    assert_eq!(unread.len(), 2);
    assert_eq!(unread[0].count, Some(1));
    assert_ne!(unread[0].id, unread[1].id);
}

#[tokio::test]
async fn test_finalize_emits_total_and_mark_read_flow() {
    let mut fx = setup();
    let order = fx
        .ledger
        .create(
            Some("T1".to_string()),
            vec![
                LineItemInput::new("prod-a", 2),
                LineItemInput::new("prod-b", 2),
            ],
            None,
            false,
        )
        .await
        .unwrap();

    fx.ledger
        .transition_status(
            &order.id,
            OrderUpdate {
                status: Some(OrderStatus::Finalized),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    fx.pump().await;

    let unread = fx.notifier.list_unread(50).await.unwrap();
    assert_eq!(unread.len(), 1);
    let n = &unread[0];
    assert_eq!(n.kind, NotificationType::OrderFinalized);
    match &n.content {
        NotificationContent::OrderFinalized { total, .. } => {
            assert_eq!(*total, dec("30.00"));
        }
        other => panic!("unexpected content: {:?}", other),
    }

    // consumer acknowledges: gone from the unread list, record remains
    assert!(fx.notifier.mark_read(&n.id).await.unwrap());
    assert!(fx.notifier.list_unread(50).await.unwrap().is_empty());
    let read_back = fx.notifier.get(&n.id).await.unwrap().unwrap();
    assert!(read_back.read);

    // a repeated write of FINALIZED is a no-op edge and emits nothing
    fx.ledger
        .transition_status(
            &order.id,
            OrderUpdate {
                status: Some(OrderStatus::Finalized),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    fx.pump().await;
    assert!(fx.notifier.list_unread(50).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_manual_order_full_flow_stays_silent() {
    let mut fx = setup();
    let order = fx
        .ledger
        .create(
            Some("T1".to_string()),
            vec![LineItemInput::new("prod-a", 1)],
            None,
            true,
        )
        .await
        .unwrap();

    fx.ledger
        .add_item(&order.id, LineItemInput::new("prod-b", 1))
        .await
        .unwrap();
    fx.ledger
        .transition_status(
            &order.id,
            OrderUpdate {
                status: Some(OrderStatus::Finalized),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    fx.pump().await;

    assert!(fx.notifier.list_unread(50).await.unwrap().is_empty());
}
