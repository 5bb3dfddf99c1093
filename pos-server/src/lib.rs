//! POS order lifecycle and real-time synchronization core
//!
//! The backend core for a restaurant/bar point of sale: it owns the order
//! state machine, persists every change durably before announcing it, and
//! fans committed changes out to connected display clients (POS, kitchen,
//! bar, tickets).
//!
//! # Architecture
//!
//! ```text
//! Command → OrderManager → validate (state machine)
//!                │
//!                ├─ redb transaction (commit-or-abort)
//!                │
//!                └─ on commit → FanoutHub → all subscribers
//! ```
//!
//! Transport, authentication, and admin CRUD live outside this crate; it
//! exchanges value-typed commands and events from the `shared` crate.

pub mod hub;
pub mod orders;

// Re-exports
pub use hub::{ChannelSubscriber, DeliveryError, FanoutHub, HubConfig, SubscriberSink};
pub use orders::{OrderError, OrderManager, OrderStorage, StorageError};
