//! # mediacore-buffer
//!
//! The bounded, closeable frame FIFO and fixed-capacity frame-data pool
//! that the buffer loop and playback loop exchange decoded frames through.
//!
//! - [`BoundedFrameBuffer`] — single FIFO of `T`, blocking `put`/`take`,
//!   clearable, closeable.
//! - [`Pool`] — fixed-capacity allocator of reusable raw video blocks.
//! - [`BufferConfig`] — capacities used when a pipeline constructs its
//!   buffers and pool.

#![warn(missing_docs)]
#![deny(unsafe_code)]

mod config;
mod error;
mod fifo;
mod pool;

pub use config::BufferConfig;
pub use error::{BufferError, PoolError};
pub use fifo::BoundedFrameBuffer;
pub use pool::Pool;
