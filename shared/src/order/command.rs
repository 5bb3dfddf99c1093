//! Inbound commands - requests from the transport layer to modify orders

use super::status::Status;
use serde::{Deserialize, Serialize};

/// Command envelope.
///
/// `command_id` is supplied by the client and used for idempotency: a command
/// whose id was already processed is acknowledged without being re-applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCommand {
    /// Client-generated unique id (idempotency key)
    pub command_id: String,
    /// Client timestamp (Unix milliseconds, audit only)
    pub timestamp: i64,
    /// What to do
    pub payload: CommandPayload,
}

impl OrderCommand {
    /// Wrap a payload with a fresh command id and the current time.
    pub fn new(payload: CommandPayload) -> Self {
        Self {
            command_id: uuid::Uuid::new_v4().to_string(),
            timestamp: crate::util::now_millis(),
            payload,
        }
    }
}

/// Command payload variants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandPayload {
    /// Open an order on a table with an initial set of items.
    CreateOrder {
        table_id: u64,
        items: Vec<NewItem>,
    },

    /// Move an order or a single item to a new status.
    UpdateStatus {
        target: StatusTarget,
        new_status: Status,
    },

    /// Cancel one item (kitchen reject, guest change of mind).
    CancelItem { item_id: u64 },

    /// Close out a table: complete every non-terminal item of its open order.
    CompleteTable { table_id: u64 },

    /// Replace the free-text note on an item.
    UpdateItemNote {
        item_id: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },
}

/// Line item requested at order creation.
///
/// The unit price is NOT part of the request; it is snapshotted from the menu
/// by the server at creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewItem {
    pub menu_id: u64,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Target of a status update.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum StatusTarget {
    Order(u64),
    Item(u64),
}
