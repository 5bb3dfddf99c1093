//! End-to-end service flow: commands in, durable state, events out, and
//! state surviving a process restart.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;

use pos_server::{ChannelSubscriber, FanoutHub, OrderManager, OrderStorage};
use shared::models::{DiningTable, MenuItem, TableStatus};
use shared::order::{
    CommandPayload, EventKind, EventPayload, NewItem, OrderCommand, Status, StatusTarget,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn seed(storage: &OrderStorage) {
    storage.put_table(&DiningTable::new(1, "Window 1")).unwrap();
    storage.put_table(&DiningTable::new(2, "Bar 1")).unwrap();
    storage
        .put_menu_item(&MenuItem {
            id: 10,
            name: "Flat White".to_string(),
            price: Decimal::from_str("4.20").unwrap(),
            category: "coffee".to_string(),
            description: None,
            is_available: true,
        })
        .unwrap();
    storage
        .put_menu_item(&MenuItem {
            id: 11,
            name: "Negroni".to_string(),
            price: Decimal::from_str("11.00").unwrap(),
            category: "cocktails".to_string(),
            description: Some("Gin, Campari, sweet vermouth".to_string()),
            is_available: true,
        })
        .unwrap();
}

#[tokio::test]
async fn test_full_service_flow_with_restart() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("pos.redb");

    let final_sequence;
    {
        let storage = OrderStorage::open(&db_path).unwrap();
        seed(&storage);
        let manager = Arc::new(OrderManager::new(storage, Arc::new(FanoutHub::default())));

        let (sink, mut rx) = ChannelSubscriber::new(64);
        manager.hub().subscribe("kitchen-display", Arc::new(sink));
        tokio::time::sleep(Duration::from_millis(50)).await;

        // take an order on table 1
        let mgr = Arc::clone(&manager);
        let order_id = tokio::task::spawn_blocking(move || {
            let events = mgr
                .execute(&OrderCommand::new(CommandPayload::CreateOrder {
                    table_id: 1,
                    items: vec![
                        NewItem {
                            menu_id: 10,
                            quantity: 2,
                            note: Some("extra hot".to_string()),
                        },
                        NewItem {
                            menu_id: 11,
                            quantity: 1,
                            note: None,
                        },
                    ],
                }))
                .unwrap();
            match events[0].payload {
                EventPayload::OrderCreated { order_id, .. } => order_id,
                _ => unreachable!(),
            }
        })
        .await
        .unwrap();

        let order = manager.order(order_id).unwrap().unwrap();
        assert_eq!(order.total, Decimal::from_str("19.40").unwrap());
        let flat_white_item = order.items[0].id;

        // kitchen works the coffee, then the table checks out
        let mgr = Arc::clone(&manager);
        tokio::task::spawn_blocking(move || {
            mgr.execute(&OrderCommand::new(CommandPayload::UpdateStatus {
                target: StatusTarget::Item(flat_white_item),
                new_status: Status::InProgress,
            }))
            .unwrap();
            mgr.execute(&OrderCommand::new(CommandPayload::CompleteTable {
                table_id: 1,
            }))
            .unwrap();
        })
        .await
        .unwrap();

        // the display saw everything, in sequence order
        let mut sequences = Vec::new();
        let mut kinds = Vec::new();
        while let Ok(Some(event)) =
            tokio::time::timeout(Duration::from_millis(200), rx.recv()).await
        {
            sequences.push(event.sequence);
            kinds.push(event.kind());
        }
        let mut sorted = sequences.clone();
        sorted.sort_unstable();
        assert_eq!(sequences, sorted);
        assert_eq!(kinds.first(), Some(&EventKind::OrderCreated));
        assert!(kinds.contains(&EventKind::TableCleared));

        let order = manager.order(order_id).unwrap().unwrap();
        assert_eq!(order.status, Status::Completed);
        assert!(order.items.iter().all(|i| i.status == Status::Completed));

        final_sequence = manager.current_sequence().unwrap();
        assert_eq!(sequences.last(), Some(&final_sequence));
        manager.hub().shutdown();
    }

    // restart: everything committed is still there
    let storage = OrderStorage::open(&db_path).unwrap();
    let manager = OrderManager::new(storage, Arc::new(FanoutHub::default()));

    assert_eq!(manager.current_sequence().unwrap(), final_sequence);
    let orders = manager.orders_for_table(1).unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].status, Status::Completed);
    assert_eq!(orders[0].total, Decimal::from_str("19.40").unwrap());

    let tables = manager.tables().unwrap();
    let table1 = tables.iter().find(|t| t.id == 1).unwrap();
    assert_eq!(table1.status, TableStatus::Available);

    // table is free again, a new party can sit down
    let events = manager
        .execute(&OrderCommand::new(CommandPayload::CreateOrder {
            table_id: 1,
            items: vec![NewItem {
                menu_id: 11,
                quantity: 2,
                note: None,
            }],
        }))
        .unwrap();
    assert!(matches!(
        events[0].payload,
        EventPayload::OrderCreated { .. }
    ));
}

#[tokio::test]
async fn test_two_tables_interleaved() {
    init_tracing();
    let storage = OrderStorage::open_in_memory().unwrap();
    seed(&storage);
    let manager = Arc::new(OrderManager::new(storage, Arc::new(FanoutHub::default())));

    let mgr = Arc::clone(&manager);
    tokio::task::spawn_blocking(move || {
        for table_id in [1u64, 2] {
            mgr.execute(&OrderCommand::new(CommandPayload::CreateOrder {
                table_id,
                items: vec![NewItem {
                    menu_id: 10,
                    quantity: 1,
                    note: None,
                }],
            }))
            .unwrap();
        }
        mgr.execute(&OrderCommand::new(CommandPayload::CompleteTable {
            table_id: 2,
        }))
        .unwrap();
    })
    .await
    .unwrap();

    let open = manager.open_orders().unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].table_id, 1);

    let occupancy = manager.table_occupancy().unwrap();
    assert_eq!(occupancy.total, 2);
    assert_eq!(occupancy.occupied, 1);

    let today = chrono::Local::now().date_naive();
    let sales = manager.daily_sales(today).unwrap();
    assert_eq!(sales.total, Decimal::from_str("4.20").unwrap());
    assert_eq!(sales.tables_served, 1);
}
