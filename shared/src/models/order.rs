//! Order and order item models

use crate::order::Status;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single line item of an order.
///
/// `unit_price` is snapshotted from the menu when the item is created; later
/// menu edits never change it. An item's status may advance independently of
/// the parent order for partial fulfillment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub id: u64,
    pub order_id: u64,
    pub menu_id: u64,
    /// Menu name snapshot for display without a join
    pub menu_name: String,
    pub quantity: u32,
    /// Price snapshot at creation time (decimal-exact)
    pub unit_price: Decimal,
    /// unit_price * quantity, computed once at creation
    pub subtotal: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub status: Status,
    pub created_at: i64,
    pub updated_at: i64,
}

/// An order: the unit of work opened against a table.
///
/// Owns its items. Never hard-deleted; cancellation is a status transition so
/// sales history stays intact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: u64,
    pub table_id: u64,
    pub status: Status,
    pub items: Vec<OrderItem>,
    /// Sum of item subtotals at insertion time; not recomputed on later
    /// status changes.
    pub total: Decimal,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    /// Whether the order still counts against its table.
    pub fn is_open(&self) -> bool {
        !self.status.is_terminal()
    }

    pub fn item(&self, item_id: u64) -> Option<&OrderItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    pub fn item_mut(&mut self, item_id: u64) -> Option<&mut OrderItem> {
        self.items.iter_mut().find(|i| i.id == item_id)
    }

    /// Items that are neither completed nor cancelled.
    pub fn non_terminal_items(&self) -> impl Iterator<Item = &OrderItem> {
        self.items.iter().filter(|i| !i.status.is_terminal())
    }
}
