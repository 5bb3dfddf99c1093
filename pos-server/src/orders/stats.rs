//! Read-side aggregates for dashboards
//!
//! Computed on demand from stored orders; nothing here writes. Revenue
//! counts completed items only, so cancelled lines never inflate a day's
//! takings even when their order total still carries them. Days are local
//! calendar days: a bar's post-midnight orders belong to the local date
//! they were rung up on, not the UTC one.

use std::collections::HashMap;

use chrono::{DateTime, Local, NaiveDate};
use rust_decimal::Decimal;

use super::storage::{OrderStorage, StorageError};
use shared::models::{Order, TableStatus};
use shared::order::Status;

#[derive(Debug, Clone, PartialEq)]
pub struct DailySales {
    pub date: NaiveDate,
    /// Sum of completed item subtotals
    pub total: Decimal,
    /// Sum of completed item quantities
    pub items_sold: u64,
    /// Distinct tables with at least one completed item
    pub tables_served: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableOccupancy {
    pub total: usize,
    pub occupied: usize,
}

fn order_date(order: &Order) -> Option<NaiveDate> {
    DateTime::from_timestamp_millis(order.created_at)
        .map(|dt| dt.with_timezone(&Local).date_naive())
}

pub fn daily_sales(storage: &OrderStorage, date: NaiveDate) -> Result<DailySales, StorageError> {
    let mut total = Decimal::ZERO;
    let mut items_sold = 0u64;
    let mut tables = std::collections::HashSet::new();

    for order in storage.all_orders()? {
        if order_date(&order) != Some(date) {
            continue;
        }
        for item in &order.items {
            if item.status == Status::Completed {
                total += item.subtotal;
                items_sold += u64::from(item.quantity);
                tables.insert(order.table_id);
            }
        }
    }

    Ok(DailySales {
        date,
        total,
        items_sold,
        tables_served: tables.len(),
    })
}

/// Item counts per status for one day's orders.
pub fn status_counts(
    storage: &OrderStorage,
    date: NaiveDate,
) -> Result<HashMap<Status, u64>, StorageError> {
    let mut counts = HashMap::new();
    for order in storage.all_orders()? {
        if order_date(&order) != Some(date) {
            continue;
        }
        for item in &order.items {
            *counts.entry(item.status).or_insert(0) += 1;
        }
    }
    Ok(counts)
}

pub fn table_occupancy(storage: &OrderStorage) -> Result<TableOccupancy, StorageError> {
    let tables = storage.tables()?;
    let occupied = tables
        .iter()
        .filter(|t| t.status == TableStatus::Occupied)
        .count();
    Ok(TableOccupancy {
        total: tables.len(),
        occupied,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::actions::{CancelItemAction, CreateOrderAction, UpdateStatusAction};
    use crate::orders::test_support::{meta, seed_menu, seed_table};
    use crate::orders::traits::{CommandAction, CommandContext};
    use shared::order::{NewItem, StatusTarget};
    use std::str::FromStr;

    fn setup() -> (OrderStorage, u64, Vec<u64>) {
        let storage = OrderStorage::open_in_memory().unwrap();
        seed_table(&storage, 1, "T1");
        seed_table(&storage, 2, "T2");
        seed_menu(&storage, 5, "Espresso", "3.50");
        seed_menu(&storage, 6, "Tonic", "2.00");

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage);
        CreateOrderAction {
            table_id: 1,
            items: vec![
                NewItem {
                    menu_id: 5,
                    quantity: 2,
                    note: None,
                },
                NewItem {
                    menu_id: 6,
                    quantity: 1,
                    note: None,
                },
            ],
        }
        .execute(&mut ctx, &meta("cmd-setup"))
        .unwrap();
        txn.commit().unwrap();

        let order = storage.open_orders().unwrap().remove(0);
        let item_ids = order.items.iter().map(|i| i.id).collect();
        (storage, order.id, item_ids)
    }

    #[test]
    fn test_daily_sales_counts_completed_items_only() {
        let (storage, _, item_ids) = setup();
        let today = Local::now().date_naive();

        // nothing completed yet
        let sales = daily_sales(&storage, today).unwrap();
        assert_eq!(sales.total, Decimal::ZERO);
        assert_eq!(sales.items_sold, 0);
        assert_eq!(sales.tables_served, 0);

        // complete the 2x espresso, cancel the tonic
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage);
        UpdateStatusAction {
            target: StatusTarget::Item(item_ids[0]),
            new_status: Status::Completed,
        }
        .execute(&mut ctx, &meta("cmd-1"))
        .unwrap();
        CancelItemAction {
            item_id: item_ids[1],
        }
        .execute(&mut ctx, &meta("cmd-2"))
        .unwrap();
        txn.commit().unwrap();

        let sales = daily_sales(&storage, today).unwrap();
        assert_eq!(sales.total, Decimal::from_str("7.00").unwrap());
        assert_eq!(sales.items_sold, 2);
        assert_eq!(sales.tables_served, 1);

        // other days stay empty
        let yesterday = today.pred_opt().unwrap();
        assert_eq!(daily_sales(&storage, yesterday).unwrap().items_sold, 0);
    }

    #[test]
    fn test_orders_bucket_by_local_calendar_day() {
        let now = Local::now();
        let order = Order {
            id: 1,
            table_id: 1,
            status: Status::Pending,
            items: vec![],
            total: Decimal::ZERO,
            created_at: now.timestamp_millis(),
            updated_at: now.timestamp_millis(),
        };
        // a post-midnight local order must land on the local date, which
        // differs from the UTC date whenever an offset crosses midnight
        assert_eq!(order_date(&order), Some(now.date_naive()));
    }

    #[test]
    fn test_status_counts() {
        let (storage, _, item_ids) = setup();
        let today = Local::now().date_naive();

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage);
        CancelItemAction {
            item_id: item_ids[1],
        }
        .execute(&mut ctx, &meta("cmd-1"))
        .unwrap();
        txn.commit().unwrap();

        let counts = status_counts(&storage, today).unwrap();
        assert_eq!(counts.get(&Status::Pending), Some(&1));
        assert_eq!(counts.get(&Status::Cancelled), Some(&1));
        assert_eq!(counts.get(&Status::Completed), None);
    }

    #[test]
    fn test_table_occupancy() {
        let (storage, order_id, _) = setup();

        let occupancy = table_occupancy(&storage).unwrap();
        assert_eq!(
            occupancy,
            TableOccupancy {
                total: 2,
                occupied: 1
            }
        );

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage);
        UpdateStatusAction {
            target: StatusTarget::Order(order_id),
            new_status: Status::Completed,
        }
        .execute(&mut ctx, &meta("cmd-1"))
        .unwrap();
        txn.commit().unwrap();

        let occupancy = table_occupancy(&storage).unwrap();
        assert_eq!(occupancy.occupied, 0);
    }
}
