//! UpdateStatus command action
//!
//! Applies a status transition to an order or a single item. Order-level
//! terminal transitions cascade to the order's non-terminal items and free
//! the table.

use tracing::info;

use crate::orders::traits::{
    CommandAction, CommandContext, CommandMetadata, OrderError, OrderResult,
};
use shared::models::TableStatus;
use shared::order::{EventPayload, OrderEvent, Status, StatusTarget, TargetKind};
use shared::util::now_millis;

#[derive(Debug, Clone)]
pub struct UpdateStatusAction {
    pub target: StatusTarget,
    pub new_status: Status,
}

impl CommandAction for UpdateStatusAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        meta: &CommandMetadata,
    ) -> OrderResult<Vec<OrderEvent>> {
        match self.target {
            StatusTarget::Item(item_id) => self.apply_to_item(ctx, meta, item_id),
            StatusTarget::Order(order_id) => self.apply_to_order(ctx, meta, order_id),
        }
    }
}

impl UpdateStatusAction {
    fn apply_to_item(
        &self,
        ctx: &mut CommandContext<'_>,
        meta: &CommandMetadata,
        item_id: u64,
    ) -> OrderResult<Vec<OrderEvent>> {
        let order_id = ctx
            .order_for_item(item_id)?
            .ok_or_else(|| OrderError::not_found(format!("order item {item_id}")))?;
        let mut order = ctx
            .order(order_id)?
            .ok_or_else(|| OrderError::not_found(format!("order {order_id}")))?;

        let now = now_millis();
        let item = order
            .item_mut(item_id)
            .ok_or_else(|| OrderError::not_found(format!("order item {item_id}")))?;
        item.status.validate_transition(self.new_status)?;
        item.status = self.new_status;
        item.updated_at = now;
        order.updated_at = now;
        ctx.save_order(&order)?;

        info!(item_id, order_id, status = %self.new_status, "Item status changed");

        let seq = ctx.next_sequence()?;
        Ok(vec![OrderEvent::new(
            seq,
            meta.command_id.clone(),
            EventPayload::StatusChanged {
                target_id: item_id,
                target_kind: TargetKind::Item,
                new_status: self.new_status,
            },
        )])
    }

    fn apply_to_order(
        &self,
        ctx: &mut CommandContext<'_>,
        meta: &CommandMetadata,
        order_id: u64,
    ) -> OrderResult<Vec<OrderEvent>> {
        let mut order = ctx
            .order(order_id)?
            .ok_or_else(|| OrderError::not_found(format!("order {order_id}")))?;

        order.status.validate_transition(self.new_status)?;
        let now = now_millis();
        order.status = self.new_status;
        order.updated_at = now;

        let mut events = Vec::new();
        let seq = ctx.next_sequence()?;
        events.push(OrderEvent::new(
            seq,
            meta.command_id.clone(),
            EventPayload::StatusChanged {
                target_id: order_id,
                target_kind: TargetKind::Order,
                new_status: self.new_status,
            },
        ));

        if self.new_status.is_terminal() {
            // Cascade: every non-terminal item follows the order
            for item in order.items.iter_mut().filter(|i| !i.status.is_terminal()) {
                item.status = self.new_status;
                item.updated_at = now;
                let seq = ctx.next_sequence()?;
                events.push(OrderEvent::new(
                    seq,
                    meta.command_id.clone(),
                    EventPayload::StatusChanged {
                        target_id: item.id,
                        target_kind: TargetKind::Item,
                        new_status: self.new_status,
                    },
                ));
            }

            // The table no longer holds this order
            ctx.clear_open_order(order.table_id)?;
            if let Some(mut table) = ctx.table(order.table_id)?
                && table.current_order == Some(order_id)
            {
                table.current_order = None;
                table.status = TableStatus::Available;
                ctx.save_table(&table)?;
                let seq = ctx.next_sequence()?;
                events.push(OrderEvent::new(
                    seq,
                    meta.command_id.clone(),
                    EventPayload::TableCleared {
                        table_id: order.table_id,
                    },
                ));
            }
        }

        ctx.save_order(&order)?;

        info!(order_id, status = %self.new_status, "Order status changed");
        Ok(events)
    }
}
