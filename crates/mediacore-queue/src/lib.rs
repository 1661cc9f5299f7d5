//! # mediacore-queue
//!
//! An ordered media queue supporting shuffle, repeat modes, and selection
//! navigation under structural mutation (add/replace/delete/clear).
//!
//! - [`MediaQueue`] — the queue itself, generic over the item type so it can
//!   hold whatever identifies a queue entry (a file path, a remote URL, a
//!   richer [`QueueItem`]).
//! - [`QueueItem`] — a concrete, ready-to-use item carrying an id and a
//!   playback location.
//! - [`RepeatMode`] — `None`, `Circular`, `Single`.
//! - [`QueueError`] — failure modes of queue operations.

#![warn(missing_docs)]
#![deny(unsafe_code)]

mod error;
mod item;
mod queue;
mod repeat;

pub use error::QueueError;
pub use item::QueueItem;
pub use queue::MediaQueue;
pub use repeat::RepeatMode;
