//! Error types for buffer and pool operations

use mediacore_types::MediaError;
use thiserror::Error;

/// Errors that can occur during bounded frame buffer operations.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum BufferError {
    /// `put`/`take` was attempted after `close()`.
    #[error("buffer is closed")]
    Closed,
}

/// Errors that can occur during frame-data pool operations.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum PoolError {
    /// `acquire` was attempted after `close()`.
    #[error("pool is closed")]
    Closed,
}

impl From<BufferError> for MediaError {
    fn from(_: BufferError) -> Self {
        MediaError::BufferClosed
    }
}

impl From<PoolError> for MediaError {
    fn from(_: PoolError) -> Self {
        MediaError::PoolClosed
    }
}
