//! CompleteTable command action
//!
//! Closes out whatever is open on a table in one step (checkout). Runs the
//! completed transition on the open order, which cascades to its pending and
//! in-progress items and frees the table. A table with nothing open is a
//! successful no-op, so a double-tap on the checkout button stays harmless.

use tracing::debug;

use super::UpdateStatusAction;
use crate::orders::traits::{CommandAction, CommandContext, CommandMetadata, OrderResult};
use shared::order::{OrderEvent, Status, StatusTarget};

#[derive(Debug, Clone)]
pub struct CompleteTableAction {
    pub table_id: u64,
}

impl CommandAction for CompleteTableAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        meta: &CommandMetadata,
    ) -> OrderResult<Vec<OrderEvent>> {
        let Some(order_id) = ctx.open_order_for_table(self.table_id)? else {
            debug!(table_id = self.table_id, "Nothing open on table, no-op");
            return Ok(Vec::new());
        };

        UpdateStatusAction {
            target: StatusTarget::Order(order_id),
            new_status: Status::Completed,
        }
        .execute(ctx, meta)
    }
}
