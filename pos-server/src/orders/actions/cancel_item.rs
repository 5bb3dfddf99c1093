//! CancelItem command action
//!
//! Cancels a single line item (kitchen reject, guest change of mind).
//! Cancellation is the `cancelled` status transition, never row removal.

use super::UpdateStatusAction;
use crate::orders::traits::{CommandAction, CommandContext, CommandMetadata, OrderResult};
use shared::order::{OrderEvent, Status, StatusTarget};

#[derive(Debug, Clone)]
pub struct CancelItemAction {
    pub item_id: u64,
}

impl CommandAction for CancelItemAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        meta: &CommandMetadata,
    ) -> OrderResult<Vec<OrderEvent>> {
        UpdateStatusAction {
            target: StatusTarget::Item(self.item_id),
            new_status: Status::Cancelled,
        }
        .execute(ctx, meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::actions::CreateOrderAction;
    use crate::orders::storage::OrderStorage;
    use crate::orders::test_support::{meta, seed_menu, seed_table};
    use crate::orders::traits::OrderError;
    use shared::order::{EventPayload, NewItem, TargetKind};

    #[test]
    fn test_cancel_item_emits_status_changed() {
        let storage = OrderStorage::open_in_memory().unwrap();
        seed_table(&storage, 1, "T1");
        seed_menu(&storage, 5, "Espresso", "3.50");

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage);
        CreateOrderAction {
            table_id: 1,
            items: vec![NewItem {
                menu_id: 5,
                quantity: 1,
                note: None,
            }],
        }
        .execute(&mut ctx, &meta("cmd-1"))
        .unwrap();
        txn.commit().unwrap();

        let order = &storage.open_orders().unwrap()[0];
        let item_id = order.items[0].id;

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage);
        let events = CancelItemAction { item_id }
            .execute(&mut ctx, &meta("cmd-2"))
            .unwrap();
        txn.commit().unwrap();

        assert_eq!(
            events[0].payload,
            EventPayload::StatusChanged {
                target_id: item_id,
                target_kind: TargetKind::Item,
                new_status: Status::Cancelled,
            }
        );

        // cancelling again is an invalid edge, not a no-op
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage);
        let result = CancelItemAction { item_id }.execute(&mut ctx, &meta("cmd-3"));
        assert!(matches!(result, Err(OrderError::InvalidTransition(_))));
    }
}
