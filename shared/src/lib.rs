//! Shared types for the POS order core
//!
//! Common types used by the server core and display clients: the order data
//! model, the status state machine, command and event envelopes.

pub mod models;
pub mod order;
pub mod util;

// Re-exports
pub use order::{
    CommandPayload, EventPayload, NewItem, OrderCommand, OrderEvent, Status, StatusTarget,
    TargetKind,
};
