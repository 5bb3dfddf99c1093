//! CreateOrder command action
//!
//! Opens an order on a table with an initial set of items. Unit prices are
//! snapshotted from the menu here and never recomputed afterwards.

use rust_decimal::Decimal;
use tracing::info;

use crate::orders::traits::{
    CommandAction, CommandContext, CommandMetadata, OrderError, OrderResult,
};
use shared::models::{Order, OrderItem, TableStatus};
use shared::order::{EventPayload, NewItem, OrderEvent, Status};
use shared::util::now_millis;

#[derive(Debug, Clone)]
pub struct CreateOrderAction {
    pub table_id: u64,
    pub items: Vec<NewItem>,
}

impl CommandAction for CreateOrderAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        meta: &CommandMetadata,
    ) -> OrderResult<Vec<OrderEvent>> {
        // Shape validation before touching any state
        if self.items.is_empty() {
            return Err(OrderError::validation("order must contain at least one item"));
        }
        for item in &self.items {
            if item.quantity < 1 {
                return Err(OrderError::validation(format!(
                    "quantity must be at least 1 (menu item {})",
                    item.menu_id
                )));
            }
        }

        let mut table = ctx
            .table(self.table_id)?
            .ok_or_else(|| OrderError::not_found(format!("table {}", self.table_id)))?;

        // One open order per table
        if let Some(existing) = ctx.open_order_for_table(self.table_id)? {
            return Err(OrderError::validation(format!(
                "table {} already has an open order ({})",
                table.name, existing
            )));
        }

        let order_id = ctx.next_order_id()?;
        let now = now_millis();

        let mut items = Vec::with_capacity(self.items.len());
        let mut total = Decimal::ZERO;
        for requested in &self.items {
            let menu = ctx.menu_item(requested.menu_id)?.ok_or_else(|| {
                OrderError::not_found(format!("menu item {}", requested.menu_id))
            })?;
            if !menu.is_available {
                return Err(OrderError::validation(format!(
                    "menu item '{}' is not available",
                    menu.name
                )));
            }

            // Price snapshot: later menu edits never change this item
            let subtotal = menu.price * Decimal::from(requested.quantity);
            total += subtotal;
            items.push(OrderItem {
                id: ctx.next_item_id()?,
                order_id,
                menu_id: menu.id,
                menu_name: menu.name,
                quantity: requested.quantity,
                unit_price: menu.price,
                subtotal,
                note: requested.note.clone(),
                status: Status::Pending,
                created_at: now,
                updated_at: now,
            });
        }

        let order = Order {
            id: order_id,
            table_id: self.table_id,
            status: Status::Pending,
            items,
            total,
            created_at: now,
            updated_at: now,
        };
        ctx.save_order(&order)?;
        ctx.set_open_order(self.table_id, order_id)?;

        table.status = TableStatus::Occupied;
        table.current_order = Some(order_id);
        ctx.save_table(&table)?;

        info!(
            order_id,
            table_id = self.table_id,
            item_count = order.items.len(),
            total = %order.total,
            "Order created"
        );

        let seq = ctx.next_sequence()?;
        Ok(vec![OrderEvent::new(
            seq,
            meta.command_id.clone(),
            EventPayload::OrderCreated {
                order_id,
                table_id: self.table_id,
                total,
            },
        )])
    }
}
