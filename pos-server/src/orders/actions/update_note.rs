//! UpdateItemNote command action

use tracing::info;

use crate::orders::traits::{
    CommandAction, CommandContext, CommandMetadata, OrderError, OrderResult,
};
use shared::order::{EventPayload, OrderEvent};
use shared::util::now_millis;

/// Replaces the preparation note on a line item. `None` clears it. Allowed
/// in any item status so late corrections still reach the ticket history.
#[derive(Debug, Clone)]
pub struct UpdateItemNoteAction {
    pub item_id: u64,
    pub note: Option<String>,
}

impl CommandAction for UpdateItemNoteAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        meta: &CommandMetadata,
    ) -> OrderResult<Vec<OrderEvent>> {
        let order_id = ctx
            .order_for_item(self.item_id)?
            .ok_or_else(|| OrderError::not_found(format!("order item {}", self.item_id)))?;
        let mut order = ctx
            .order(order_id)?
            .ok_or_else(|| OrderError::not_found(format!("order {order_id}")))?;

        let now = now_millis();
        let item = order
            .item_mut(self.item_id)
            .ok_or_else(|| OrderError::not_found(format!("order item {}", self.item_id)))?;
        item.note = self.note.clone();
        item.updated_at = now;
        order.updated_at = now;
        ctx.save_order(&order)?;

        info!(item_id = self.item_id, order_id, "Item note updated");

        let seq = ctx.next_sequence()?;
        Ok(vec![OrderEvent::new(
            seq,
            meta.command_id.clone(),
            EventPayload::ItemNoteUpdated {
                item_id: self.item_id,
                note: self.note.clone(),
            },
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::actions::CreateOrderAction;
    use crate::orders::storage::OrderStorage;
    use crate::orders::test_support::{meta, seed_menu, seed_table};
    use shared::order::NewItem;

    fn setup() -> (OrderStorage, u64) {
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
                note: Some("no sugar".to_string()),
            }],
        }
        .execute(&mut ctx, &meta("cmd-setup"))
        .unwrap();
        txn.commit().unwrap();

        let item_id = storage.open_orders().unwrap()[0].items[0].id;
        (storage, item_id)
    }

    fn set_note(storage: &OrderStorage, item_id: u64, note: Option<&str>, cmd: &str) -> OrderEvent {
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, storage);
        let mut events = UpdateItemNoteAction {
            item_id,
            note: note.map(str::to_string),
        }
        .execute(&mut ctx, &meta(cmd))
        .unwrap();
        txn.commit().unwrap();
        events.remove(0)
    }

    #[test]
    fn test_replace_and_clear_note() {
        let (storage, item_id) = setup();

        let event = set_note(&storage, item_id, Some("oat milk"), "cmd-1");
        assert_eq!(
            event.payload,
            EventPayload::ItemNoteUpdated {
                item_id,
                note: Some("oat milk".to_string()),
            }
        );
        let order = &storage.open_orders().unwrap()[0];
        assert_eq!(order.items[0].note.as_deref(), Some("oat milk"));

        set_note(&storage, item_id, None, "cmd-2");
        let order = &storage.open_orders().unwrap()[0];
        assert_eq!(order.items[0].note, None);
    }

    #[test]
    fn test_unknown_item_fails() {
        let (storage, _) = setup();

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage);
        let result = UpdateItemNoteAction {
            item_id: 999,
            note: None,
        }
        .execute(&mut ctx, &meta("cmd-1"));
        assert!(matches!(result, Err(OrderError::NotFound(_))));
    }
}
