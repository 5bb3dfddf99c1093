//! redb-based storage layer - the sole path to durable order state
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `menu` | `menu_id` | `MenuItem` | Price/name lookups |
//! | `dining_tables` | `table_id` | `DiningTable` | Table status + open-order pointer |
//! | `orders` | `order_id` | `Order` (with items) | Authoritative order state |
//! | `item_index` | `item_id` | `order_id` | Item-level addressing |
//! | `open_orders` | `table_id` | `order_id` | At most one open order per table |
//! | `processed_commands` | `command_id` | `()` | Idempotency check |
//! | `counters` | name | `u64` | Event sequence, order/item id allocation |
//!
//! # Transactions
//!
//! redb gives single-writer ACID transactions: everything written through one
//! `WriteTransaction` commits atomically or not at all (dropping the
//! transaction without `commit()` rolls back every write). Reads through
//! `begin_read` see only committed state, so no caller can observe another
//! transaction's partial writes.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::models::{DiningTable, MenuItem, Order};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

const MENU_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("menu");
const TABLES_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("dining_tables");
const ORDERS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("orders");

/// item_id -> owning order_id
const ITEM_INDEX_TABLE: TableDefinition<u64, u64> = TableDefinition::new("item_index");

/// table_id -> open order_id (absence = table has no open order)
const OPEN_ORDERS_TABLE: TableDefinition<u64, u64> = TableDefinition::new("open_orders");

/// command_id -> () (idempotency)
const PROCESSED_COMMANDS_TABLE: TableDefinition<&str, ()> =
    TableDefinition::new("processed_commands");

/// Named monotonic counters, incremented inside the owning transaction
const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("counters");

const EVENT_SEQ_KEY: &str = "event_seq";
const ORDER_ID_KEY: &str = "order_id";
const ITEM_ID_KEY: &str = "item_id";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

fn encode<T: Serialize>(value: &T) -> StorageResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StorageResult<T> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Persistence gateway backed by redb.
///
/// Cloning is cheap; all clones share the same database handle.
#[derive(Clone)]
pub struct OrderStorage {
    db: Arc<Database>,
}

impl OrderStorage {
    /// Open or create the database at the given path.
    ///
    /// Commits are durable as soon as `commit()` returns; the file is always
    /// left in a consistent state even across power loss.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    /// Open an in-memory database (tests and in-process demos).
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    fn init_tables(&self) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let _ = txn.open_table(MENU_TABLE)?;
            let _ = txn.open_table(TABLES_TABLE)?;
            let _ = txn.open_table(ORDERS_TABLE)?;
            let _ = txn.open_table(ITEM_INDEX_TABLE)?;
            let _ = txn.open_table(OPEN_ORDERS_TABLE)?;
            let _ = txn.open_table(PROCESSED_COMMANDS_TABLE)?;
            let mut counters = txn.open_table(COUNTERS_TABLE)?;
            for key in [EVENT_SEQ_KEY, ORDER_ID_KEY, ITEM_ID_KEY] {
                if counters.get(key)?.is_none() {
                    counters.insert(key, 0u64)?;
                }
            }
        }
        txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction. Blocks until it is the sole writer.
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Counters (transaction-scoped) ==========

    fn increment_counter(&self, txn: &WriteTransaction, key: &str) -> StorageResult<u64> {
        let mut table = txn.open_table(COUNTERS_TABLE)?;
        let next = table.get(key)?.map(|g| g.value()).unwrap_or(0) + 1;
        table.insert(key, next)?;
        Ok(next)
    }

    /// Allocate the next global event sequence number.
    pub fn next_sequence_txn(&self, txn: &WriteTransaction) -> StorageResult<u64> {
        self.increment_counter(txn, EVENT_SEQ_KEY)
    }

    /// Allocate the next order id.
    pub fn next_order_id_txn(&self, txn: &WriteTransaction) -> StorageResult<u64> {
        self.increment_counter(txn, ORDER_ID_KEY)
    }

    /// Allocate the next order item id.
    pub fn next_item_id_txn(&self, txn: &WriteTransaction) -> StorageResult<u64> {
        self.increment_counter(txn, ITEM_ID_KEY)
    }

    /// Last committed event sequence.
    pub fn current_sequence(&self) -> StorageResult<u64> {
        let read = self.db.begin_read()?;
        let table = read.open_table(COUNTERS_TABLE)?;
        Ok(table.get(EVENT_SEQ_KEY)?.map(|g| g.value()).unwrap_or(0))
    }

    // ========== Orders ==========

    /// Write an order and index its items (read-your-writes within `txn`).
    pub fn put_order_txn(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        let bytes = encode(order)?;
        let mut orders = txn.open_table(ORDERS_TABLE)?;
        orders.insert(order.id, bytes.as_slice())?;
        let mut index = txn.open_table(ITEM_INDEX_TABLE)?;
        for item in &order.items {
            index.insert(item.id, order.id)?;
        }
        Ok(())
    }

    /// Load an order within a write transaction.
    pub fn get_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: u64,
    ) -> StorageResult<Option<Order>> {
        let table = txn.open_table(ORDERS_TABLE)?;
        table
            .get(order_id)?
            .map(|g| decode(g.value()))
            .transpose()
    }

    /// Load an order from committed state.
    pub fn get_order(&self, order_id: u64) -> StorageResult<Option<Order>> {
        let read = self.db.begin_read()?;
        let table = read.open_table(ORDERS_TABLE)?;
        table
            .get(order_id)?
            .map(|g| decode(g.value()))
            .transpose()
    }

    /// Resolve the owning order of an item, within a write transaction.
    pub fn order_for_item_txn(
        &self,
        txn: &WriteTransaction,
        item_id: u64,
    ) -> StorageResult<Option<u64>> {
        let table = txn.open_table(ITEM_INDEX_TABLE)?;
        Ok(table.get(item_id)?.map(|g| g.value()))
    }

    /// Resolve the owning order of an item from committed state.
    pub fn order_for_item(&self, item_id: u64) -> StorageResult<Option<u64>> {
        let read = self.db.begin_read()?;
        let table = read.open_table(ITEM_INDEX_TABLE)?;
        Ok(table.get(item_id)?.map(|g| g.value()))
    }

    /// All committed orders (history included).
    pub fn all_orders(&self) -> StorageResult<Vec<Order>> {
        let read = self.db.begin_read()?;
        let table = read.open_table(ORDERS_TABLE)?;
        let mut orders = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            orders.push(decode(value.value())?);
        }
        Ok(orders)
    }

    /// Orders ever placed against one table, newest first.
    pub fn orders_for_table(&self, table_id: u64) -> StorageResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .all_orders()?
            .into_iter()
            .filter(|o| o.table_id == table_id)
            .collect();
        orders.sort_by_key(|o| std::cmp::Reverse(o.created_at));
        Ok(orders)
    }

    /// All currently open (non-terminal) orders.
    pub fn open_orders(&self) -> StorageResult<Vec<Order>> {
        let read = self.db.begin_read()?;
        let index = read.open_table(OPEN_ORDERS_TABLE)?;
        let orders = read.open_table(ORDERS_TABLE)?;
        let mut result = Vec::new();
        for entry in index.iter()? {
            let (_, order_id) = entry?;
            if let Some(order) = orders.get(order_id.value())? {
                result.push(decode(order.value())?);
            }
        }
        Ok(result)
    }

    // ========== Open-order index ==========

    pub fn open_order_for_table_txn(
        &self,
        txn: &WriteTransaction,
        table_id: u64,
    ) -> StorageResult<Option<u64>> {
        let table = txn.open_table(OPEN_ORDERS_TABLE)?;
        Ok(table.get(table_id)?.map(|g| g.value()))
    }

    pub fn open_order_for_table(&self, table_id: u64) -> StorageResult<Option<u64>> {
        let read = self.db.begin_read()?;
        let table = read.open_table(OPEN_ORDERS_TABLE)?;
        Ok(table.get(table_id)?.map(|g| g.value()))
    }

    pub fn set_open_order_txn(
        &self,
        txn: &WriteTransaction,
        table_id: u64,
        order_id: u64,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(OPEN_ORDERS_TABLE)?;
        table.insert(table_id, order_id)?;
        Ok(())
    }

    pub fn clear_open_order_txn(&self, txn: &WriteTransaction, table_id: u64) -> StorageResult<()> {
        let mut table = txn.open_table(OPEN_ORDERS_TABLE)?;
        table.remove(table_id)?;
        Ok(())
    }

    // ========== Dining tables ==========

    pub fn put_table_txn(&self, txn: &WriteTransaction, table: &DiningTable) -> StorageResult<()> {
        let bytes = encode(table)?;
        let mut tables = txn.open_table(TABLES_TABLE)?;
        tables.insert(table.id, bytes.as_slice())?;
        Ok(())
    }

    pub fn get_table_txn(
        &self,
        txn: &WriteTransaction,
        table_id: u64,
    ) -> StorageResult<Option<DiningTable>> {
        let table = txn.open_table(TABLES_TABLE)?;
        table.get(table_id)?.map(|g| decode(g.value())).transpose()
    }

    pub fn get_table(&self, table_id: u64) -> StorageResult<Option<DiningTable>> {
        let read = self.db.begin_read()?;
        let table = read.open_table(TABLES_TABLE)?;
        table.get(table_id)?.map(|g| decode(g.value())).transpose()
    }

    /// All dining tables.
    pub fn tables(&self) -> StorageResult<Vec<DiningTable>> {
        let read = self.db.begin_read()?;
        let table = read.open_table(TABLES_TABLE)?;
        let mut result = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            result.push(decode(value.value())?);
        }
        Ok(result)
    }

    /// Upsert a dining table (admin/seed path, own transaction).
    pub fn put_table(&self, table: &DiningTable) -> StorageResult<()> {
        let txn = self.begin_write()?;
        self.put_table_txn(&txn, table)?;
        txn.commit()?;
        Ok(())
    }

    // ========== Menu ==========

    pub fn get_menu_item_txn(
        &self,
        txn: &WriteTransaction,
        menu_id: u64,
    ) -> StorageResult<Option<MenuItem>> {
        let table = txn.open_table(MENU_TABLE)?;
        table.get(menu_id)?.map(|g| decode(g.value())).transpose()
    }

    pub fn get_menu_item(&self, menu_id: u64) -> StorageResult<Option<MenuItem>> {
        let read = self.db.begin_read()?;
        let table = read.open_table(MENU_TABLE)?;
        table.get(menu_id)?.map(|g| decode(g.value())).transpose()
    }

    /// All menu entries.
    pub fn menu(&self) -> StorageResult<Vec<MenuItem>> {
        let read = self.db.begin_read()?;
        let table = read.open_table(MENU_TABLE)?;
        let mut result = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            result.push(decode(value.value())?);
        }
        Ok(result)
    }

    /// Upsert a menu entry (admin/seed path, own transaction).
    pub fn put_menu_item(&self, item: &MenuItem) -> StorageResult<()> {
        let txn = self.begin_write()?;
        let bytes = encode(item)?;
        {
            let mut table = txn.open_table(MENU_TABLE)?;
            table.insert(item.id, bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    // ========== Command idempotency ==========

    pub fn is_command_processed_txn(
        &self,
        txn: &WriteTransaction,
        command_id: &str,
    ) -> StorageResult<bool> {
        let table = txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        Ok(table.get(command_id)?.is_some())
    }

    pub fn mark_command_processed_txn(
        &self,
        txn: &WriteTransaction,
        command_id: &str,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        table.insert(command_id, ())?;
        Ok(())
    }
}

impl std::fmt::Debug for OrderStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderStorage").finish_non_exhaustive()
    }
}
