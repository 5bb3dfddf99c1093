//! Order events - immutable facts broadcast after a command commits

use super::status::Status;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Event envelope delivered to every connected display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderEvent {
    /// Event unique id
    pub event_id: String,
    /// Global sequence number, allocated inside the committing transaction.
    /// Sequence order equals commit order and is the authoritative ordering
    /// for every subscriber.
    pub sequence: u64,
    /// Server timestamp (Unix milliseconds)
    pub timestamp: i64,
    /// Command that produced this event (audit tracing)
    pub command_id: String,
    /// What changed
    pub payload: EventPayload,
}

/// Event kind, for filtering and logging.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    OrderCreated,
    StatusChanged,
    TableCleared,
    ItemNoteUpdated,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::OrderCreated => write!(f, "ORDER_CREATED"),
            EventKind::StatusChanged => write!(f, "STATUS_CHANGED"),
            EventKind::TableCleared => write!(f, "TABLE_CLEARED"),
            EventKind::ItemNoteUpdated => write!(f, "ITEM_NOTE_UPDATED"),
        }
    }
}

/// Which entity a `StatusChanged` refers to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Order,
    Item,
}

/// Event payload variants
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPayload {
    OrderCreated {
        order_id: u64,
        table_id: u64,
        total: Decimal,
    },

    StatusChanged {
        target_id: u64,
        target_kind: TargetKind,
        new_status: Status,
    },

    /// The table's open order reached a terminal status.
    TableCleared { table_id: u64 },

    ItemNoteUpdated {
        item_id: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },
}

impl OrderEvent {
    /// Create a new event with a server timestamp.
    pub fn new(sequence: u64, command_id: String, payload: EventPayload) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            sequence,
            timestamp: crate::util::now_millis(),
            command_id,
            payload,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self.payload {
            EventPayload::OrderCreated { .. } => EventKind::OrderCreated,
            EventPayload::StatusChanged { .. } => EventKind::StatusChanged,
            EventPayload::TableCleared { .. } => EventKind::TableCleared,
            EventPayload::ItemNoteUpdated { .. } => EventKind::ItemNoteUpdated,
        }
    }
}
