//! Command actions - one validated state change per inbound command
//!
//! Each action implements [`CommandAction`](super::traits::CommandAction):
//! it validates against current state inside the open transaction, writes
//! the new state, and returns the events to broadcast after commit.

mod cancel_item;
mod complete_table;
mod create_order;
mod update_note;
mod update_status;

pub use cancel_item::CancelItemAction;
pub use complete_table::CompleteTableAction;
pub use create_order::CreateOrderAction;
pub use update_note::UpdateItemNoteAction;
pub use update_status::UpdateStatusAction;

use super::traits::{CommandAction, CommandContext, CommandMetadata, OrderResult};
use shared::order::{CommandPayload, OrderEvent};

/// Dispatch enum over all actions.
#[derive(Debug, Clone)]
pub enum Action {
    CreateOrder(CreateOrderAction),
    UpdateStatus(UpdateStatusAction),
    CancelItem(CancelItemAction),
    CompleteTable(CompleteTableAction),
    UpdateItemNote(UpdateItemNoteAction),
}

impl From<&CommandPayload> for Action {
    fn from(payload: &CommandPayload) -> Self {
        match payload {
            CommandPayload::CreateOrder { table_id, items } => {
                Action::CreateOrder(CreateOrderAction {
                    table_id: *table_id,
                    items: items.clone(),
                })
            }
            CommandPayload::UpdateStatus { target, new_status } => {
                Action::UpdateStatus(UpdateStatusAction {
                    target: *target,
                    new_status: *new_status,
                })
            }
            CommandPayload::CancelItem { item_id } => {
                Action::CancelItem(CancelItemAction { item_id: *item_id })
            }
            CommandPayload::CompleteTable { table_id } => {
                Action::CompleteTable(CompleteTableAction {
                    table_id: *table_id,
                })
            }
            CommandPayload::UpdateItemNote { item_id, note } => {
                Action::UpdateItemNote(UpdateItemNoteAction {
                    item_id: *item_id,
                    note: note.clone(),
                })
            }
        }
    }
}

impl CommandAction for Action {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        meta: &CommandMetadata,
    ) -> OrderResult<Vec<OrderEvent>> {
        match self {
            Action::CreateOrder(a) => a.execute(ctx, meta),
            Action::UpdateStatus(a) => a.execute(ctx, meta),
            Action::CancelItem(a) => a.execute(ctx, meta),
            Action::CompleteTable(a) => a.execute(ctx, meta),
            Action::UpdateItemNote(a) => a.execute(ctx, meta),
        }
    }
}
