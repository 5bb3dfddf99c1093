//! Order/item status state machine
//!
//! Shared by orders and their line items. Transition validation is pure and
//! table-driven; a status never changes except through an explicit command.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle status for an order or a single order item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

/// Rejected status edge.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("invalid status transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: Status,
    pub to: Status,
}

impl Status {
    /// Terminal statuses admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Completed | Status::Cancelled)
    }

    /// Whether the edge `self -> to` is in the allowed set.
    ///
    /// Allowed edges:
    /// - pending -> in_progress | completed | cancelled
    /// - in_progress -> completed | cancelled
    ///
    /// Everything else, including self-loops and any edge out of a terminal
    /// status, is rejected.
    pub fn can_transition_to(self, to: Status) -> bool {
        matches!(
            (self, to),
            (Status::Pending, Status::InProgress)
                | (Status::Pending, Status::Completed)
                | (Status::Pending, Status::Cancelled)
                | (Status::InProgress, Status::Completed)
                | (Status::InProgress, Status::Cancelled)
        )
    }

    /// Validate the edge `self -> to`.
    pub fn validate_transition(self, to: Status) -> Result<(), InvalidTransition> {
        if self.can_transition_to(to) {
            Ok(())
        } else {
            Err(InvalidTransition { from: self, to })
        }
    }

    /// All statuses, for exhaustive iteration.
    pub const ALL: [Status; 4] = [
        Status::Pending,
        Status::InProgress,
        Status::Completed,
        Status::Cancelled,
    ];
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Pending => write!(f, "pending"),
            Status::InProgress => write!(f, "in_progress"),
            Status::Completed => write!(f, "completed"),
            Status::Cancelled => write!(f, "cancelled"),
        }
    }
}
