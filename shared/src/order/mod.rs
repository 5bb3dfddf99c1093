//! Order lifecycle types
//!
//! This module provides the types exchanged around the order core:
//! - Status: the order/item state machine
//! - Commands: requests from clients to modify orders
//! - Events: immutable facts broadcast after a command commits

pub mod command;
pub mod event;
pub mod status;

// Re-exports
pub use command::{CommandPayload, NewItem, OrderCommand, StatusTarget};
pub use event::{EventKind, EventPayload, OrderEvent, TargetKind};
pub use status::{InvalidTransition, Status};
