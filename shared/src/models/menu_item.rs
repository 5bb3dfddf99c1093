//! Menu entry model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A sellable menu entry.
///
/// Menu administration lives outside the core; the core only reads entries
/// to snapshot prices onto order items.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MenuItem {
    pub id: u64,
    pub name: String,
    /// Current list price (decimal-exact)
    pub price: Decimal,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

fn default_true() -> bool {
    true
}
