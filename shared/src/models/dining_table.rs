//! Dining table model

use serde::{Deserialize, Serialize};

/// Current occupancy of a table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    #[default]
    Available,
    Occupied,
    Reserved,
}

/// Dining table entity.
///
/// Invariant: a table holds at most one open (non-terminal) order at a time;
/// `current_order` points at it while it is open. The order itself outlives
/// this pointer once terminal, for historical reads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiningTable {
    pub id: u64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub status: TableStatus,
    /// Open order reference, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_order: Option<u64>,
}

impl DiningTable {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            capacity: None,
            status: TableStatus::Available,
            current_order: None,
        }
    }
}
