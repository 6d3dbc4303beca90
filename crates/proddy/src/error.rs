//! Error types shared by the store, the session engine and the planner

use thiserror::Error;

/// Failures reported by a [`crate::store::Store`] write
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store lock poisoned: {0}")]
    Poisoned(&'static str),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Rejections an operation reports back to its caller
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProddyError {
    #[error("{field} cannot be empty")]
    EmptyText { field: &'static str },

    #[error("No {list} at position {position} (you have {len})")]
    PositionOutOfRange {
        list: &'static str,
        position: usize,
        len: usize,
    },

    #[error(transparent)]
    Storage(#[from] StoreError),
}

pub type Result<T, E = ProddyError> = std::result::Result<T, E>;
