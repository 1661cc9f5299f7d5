//! Decoded frame representation
//!
//! A [`Frame`] is the unit of work passed from decoders through the bounded
//! buffers to the playback loop. `Video` frames carry a pool-owned
//! [`RawVideoData`] handle rather than an owned `Vec<u8>`, so the backing
//! storage can be returned to the frame-data pool once presented.

use std::time::Duration;

/// A reusable block of raw decoded video storage, acquired from a
/// frame-data pool and released back to it once the playback loop is
/// done presenting the frame it backs.
#[derive(Debug)]
pub struct RawVideoData {
    bytes: Vec<u8>,
}

impl RawVideoData {
    /// Wraps a freshly allocated block of the given size.
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: vec![0u8; capacity],
        }
    }

    /// Borrows the block's bytes immutably.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Borrows the block's bytes mutably, for a decoder to write into.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// The block's fixed capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }
}

/// A decoded unit of media flowing from a decoder to a sink.
///
/// Timestamps are monotonic per stream; the [`Frame::EndOfStream`] sentinel
/// marks the end of one decoder's output and is itself enqueued into the
/// bounded buffer so the playback loop observes it in FIFO order with real
/// frames.
#[derive(Debug)]
pub enum Frame {
    /// A decoded audio frame.
    Audio {
        /// Presentation timestamp.
        timestamp: Duration,
        /// Interleaved PCM samples.
        bytes: Vec<f32>,
    },
    /// A decoded video frame, backed by a pool-owned block.
    Video {
        /// Presentation timestamp.
        timestamp: Duration,
        /// Pool-owned raw pixel data.
        data: RawVideoData,
    },
    /// Sentinel marking the end of a decoder's stream.
    EndOfStream,
}

impl Frame {
    /// The frame's presentation timestamp, if it carries one.
    /// `EndOfStream` has no timestamp.
    pub fn timestamp(&self) -> Option<Duration> {
        match self {
            Frame::Audio { timestamp, .. } | Frame::Video { timestamp, .. } => Some(*timestamp),
            Frame::EndOfStream => None,
        }
    }

    /// Whether this frame is the end-of-stream sentinel.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Frame::EndOfStream)
    }
}
