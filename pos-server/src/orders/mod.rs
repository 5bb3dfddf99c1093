//! Order lifecycle core
//!
//! Commands come in through [`OrderManager`], execute as a single
//! transactional action, and fan out as events only after the transaction
//! committed. Storage is an embedded redb database; the manager serializes
//! command processing so the event stream observes commit order.

pub mod actions;
pub mod manager;
pub mod stats;
pub mod storage;
pub mod traits;

pub use manager::OrderManager;
pub use stats::{DailySales, TableOccupancy};
pub use storage::{OrderStorage, StorageError};
pub use traits::{CommandAction, CommandContext, CommandMetadata, OrderError, OrderResult};
