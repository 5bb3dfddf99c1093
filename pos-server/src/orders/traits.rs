//! Command execution contract: error taxonomy, transaction context, action trait

use super::storage::{OrderStorage, StorageError};
use redb::WriteTransaction;
use shared::models::{DiningTable, MenuItem, Order};
use shared::order::{InvalidTransition, OrderEvent};
use thiserror::Error;

/// Caller-visible errors of the order core.
///
/// Every variant aborts the surrounding transaction before it reaches the
/// caller; no committed-but-unannounced state exists. Delivery problems are
/// not represented here - they stay inside the fan-out hub.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Malformed or out-of-range input, rejected before any write
    #[error("validation error: {0}")]
    Validation(String),

    /// Referenced table/order/item/menu id does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Status edge not in the allowed set
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    /// The atomic unit of work failed to commit; nothing was applied
    #[error("persistence error: {0}")]
    Storage(#[from] StorageError),
}

impl OrderError {
    pub fn validation(msg: impl Into<String>) -> Self {
        OrderError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        OrderError::NotFound(msg.into())
    }
}

pub type OrderResult<T> = Result<T, OrderError>;

/// Metadata of the command being executed.
#[derive(Debug, Clone)]
pub struct CommandMetadata {
    pub command_id: String,
    /// Client timestamp (audit only; state carries server time)
    pub timestamp: i64,
}

/// Unit of work handed to an action.
///
/// Wraps the open write transaction so every read sees the action's own
/// writes and every write commits or aborts together.
pub struct CommandContext<'a> {
    txn: &'a WriteTransaction,
    storage: &'a OrderStorage,
}

impl<'a> CommandContext<'a> {
    pub fn new(txn: &'a WriteTransaction, storage: &'a OrderStorage) -> Self {
        Self { txn, storage }
    }

    pub fn next_sequence(&mut self) -> OrderResult<u64> {
        Ok(self.storage.next_sequence_txn(self.txn)?)
    }

    pub fn next_order_id(&mut self) -> OrderResult<u64> {
        Ok(self.storage.next_order_id_txn(self.txn)?)
    }

    pub fn next_item_id(&mut self) -> OrderResult<u64> {
        Ok(self.storage.next_item_id_txn(self.txn)?)
    }

    pub fn menu_item(&self, menu_id: u64) -> OrderResult<Option<MenuItem>> {
        Ok(self.storage.get_menu_item_txn(self.txn, menu_id)?)
    }

    pub fn table(&self, table_id: u64) -> OrderResult<Option<DiningTable>> {
        Ok(self.storage.get_table_txn(self.txn, table_id)?)
    }

    pub fn save_table(&mut self, table: &DiningTable) -> OrderResult<()> {
        Ok(self.storage.put_table_txn(self.txn, table)?)
    }

    pub fn order(&self, order_id: u64) -> OrderResult<Option<Order>> {
        Ok(self.storage.get_order_txn(self.txn, order_id)?)
    }

    pub fn save_order(&mut self, order: &Order) -> OrderResult<()> {
        Ok(self.storage.put_order_txn(self.txn, order)?)
    }

    pub fn order_for_item(&self, item_id: u64) -> OrderResult<Option<u64>> {
        Ok(self.storage.order_for_item_txn(self.txn, item_id)?)
    }

    pub fn open_order_for_table(&self, table_id: u64) -> OrderResult<Option<u64>> {
        Ok(self.storage.open_order_for_table_txn(self.txn, table_id)?)
    }

    pub fn set_open_order(&mut self, table_id: u64, order_id: u64) -> OrderResult<()> {
        Ok(self.storage.set_open_order_txn(self.txn, table_id, order_id)?)
    }

    pub fn clear_open_order(&mut self, table_id: u64) -> OrderResult<()> {
        Ok(self.storage.clear_open_order_txn(self.txn, table_id)?)
    }
}

/// A validated state change executed inside one transaction.
///
/// Implementations validate against current state, write the new state
/// through the context, and return the events to broadcast after commit.
/// Returning an error aborts the whole transaction.
pub trait CommandAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        meta: &CommandMetadata,
    ) -> OrderResult<Vec<OrderEvent>>;
}
