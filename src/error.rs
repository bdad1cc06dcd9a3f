use thiserror::Error;

use crate::api::ApiError;
use crate::queue::ItemId;

#[derive(Debug, Error)]
pub enum QueueError {
    /// Rejected locally before any request was made.
    #[error("{0}")]
    Validation(String),

    #[error("No item {0} in the loaded batch")]
    UnknownItem(ItemId),

    #[error("No active batch. Generate one first.")]
    NoActiveBatch,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// The three ways an operator action can fail. Every one leaves the store untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Caught before any network call.
    Validation,
    /// The request never reached the server.
    Transport,
    /// The server answered with an error.
    ServerRejection,
}

impl QueueError {
    pub fn kind(&self) -> FailureKind {
        match self {
            QueueError::Validation(_) | QueueError::UnknownItem(_) => FailureKind::Validation,
            QueueError::NoActiveBatch => FailureKind::ServerRejection,
            QueueError::Api(ApiError::Transport(_)) => FailureKind::Transport,
            QueueError::Api(ApiError::Rejected { .. } | ApiError::Decode(_)) => {
                FailureKind::ServerRejection
            }
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Validation => write!(f, "Validation"),
            FailureKind::Transport => write!(f, "Transport"),
            FailureKind::ServerRejection => write!(f, "Server rejection"),
        }
    }
}
