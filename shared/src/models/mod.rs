//! Data model entities
//!
//! Plain serde structs persisted by the server's storage layer and returned
//! to read-side queries. Money fields are `rust_decimal::Decimal`; prices on
//! order items are snapshots taken at creation time and never recomputed
//! from the live menu.

pub mod dining_table;
pub mod menu_item;
pub mod order;

pub use dining_table::{DiningTable, TableStatus};
pub use menu_item::MenuItem;
pub use order::{Order, OrderItem};
