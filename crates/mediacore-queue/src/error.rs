//! Error types for media queue operations

use thiserror::Error;

/// Errors that can occur during [`crate::MediaQueue`] operations.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum QueueError {
    /// `replace(from, to)` was called but `from` is not present in the queue.
    #[error("item not found in queue")]
    NotFound,
}
