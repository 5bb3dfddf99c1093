//! Order manager - the single command entry point
//!
//! Processing pipeline per command:
//!
//! 1. take the command lock
//! 2. open a write transaction
//! 3. drop duplicates (command id already processed)
//! 4. run the action; any error aborts the transaction
//! 5. mark the command processed and commit
//! 6. publish the committed events to the hub
//!
//! The lock spans commit and publish, so events enter the hub in commit
//! order. Storage commits serialize anyway (single writer), the lock only
//! extends that window over the publish step.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::Mutex;
use tracing::{debug, error, info};

use super::actions::Action;
use super::stats::{self, DailySales, TableOccupancy};
use super::storage::{OrderStorage, StorageError};
use super::traits::{CommandAction, CommandContext, CommandMetadata, OrderResult};
use crate::hub::FanoutHub;
use shared::models::{DiningTable, MenuItem, Order};
use shared::order::{OrderCommand, OrderEvent, Status};

pub struct OrderManager {
    storage: OrderStorage,
    hub: Arc<FanoutHub>,
    command_lock: Mutex<()>,
}

impl OrderManager {
    pub fn new(storage: OrderStorage, hub: Arc<FanoutHub>) -> Self {
        Self {
            storage,
            hub,
            command_lock: Mutex::new(()),
        }
    }

    /// Execute one command: validate, persist atomically, then announce.
    ///
    /// Returns the events the command produced. A replayed command id
    /// returns an empty vec and changes nothing. On any error the
    /// transaction is dropped and no event is published.
    pub fn execute(&self, command: &OrderCommand) -> OrderResult<Vec<OrderEvent>> {
        let _guard = self.command_lock.lock();

        let txn = self.storage.begin_write()?;
        if self
            .storage
            .is_command_processed_txn(&txn, &command.command_id)?
        {
            debug!(command_id = %command.command_id, "Duplicate command, skipping");
            return Ok(Vec::new());
        }

        let meta = CommandMetadata {
            command_id: command.command_id.clone(),
            timestamp: command.timestamp,
        };
        let action = Action::from(&command.payload);
        let mut ctx = CommandContext::new(&txn, &self.storage);
        let events = match action.execute(&mut ctx, &meta) {
            Ok(events) => events,
            Err(err) => {
                // txn dropped here, all writes roll back
                error!(command_id = %command.command_id, %err, "Command rejected");
                return Err(err);
            }
        };
        self.storage
            .mark_command_processed_txn(&txn, &command.command_id)?;
        txn.commit().map_err(StorageError::from)?;

        info!(
            command_id = %command.command_id,
            event_count = events.len(),
            "Command committed"
        );
        for event in &events {
            self.hub.publish(event);
        }
        Ok(events)
    }

    pub fn hub(&self) -> &Arc<FanoutHub> {
        &self.hub
    }

    // Read side, served straight from storage. A reconnecting display calls
    // these to resync, then follows the live stream from the hub.

    pub fn order(&self, order_id: u64) -> OrderResult<Option<Order>> {
        Ok(self.storage.get_order(order_id)?)
    }

    pub fn orders(&self) -> OrderResult<Vec<Order>> {
        Ok(self.storage.all_orders()?)
    }

    pub fn orders_for_table(&self, table_id: u64) -> OrderResult<Vec<Order>> {
        Ok(self.storage.orders_for_table(table_id)?)
    }

    pub fn open_orders(&self) -> OrderResult<Vec<Order>> {
        Ok(self.storage.open_orders()?)
    }

    pub fn tables(&self) -> OrderResult<Vec<DiningTable>> {
        Ok(self.storage.tables()?)
    }

    pub fn menu(&self) -> OrderResult<Vec<MenuItem>> {
        Ok(self.storage.menu()?)
    }

    /// Highest event sequence committed so far.
    pub fn current_sequence(&self) -> OrderResult<u64> {
        Ok(self.storage.current_sequence()?)
    }

    pub fn daily_sales(&self, date: NaiveDate) -> OrderResult<DailySales> {
        Ok(stats::daily_sales(&self.storage, date)?)
    }

    pub fn status_counts(&self, date: NaiveDate) -> OrderResult<HashMap<Status, u64>> {
        Ok(stats::status_counts(&self.storage, date)?)
    }

    pub fn table_occupancy(&self) -> OrderResult<TableOccupancy> {
        Ok(stats::table_occupancy(&self.storage)?)
    }
}
