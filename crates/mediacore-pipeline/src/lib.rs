//! Decoder/buffer/sampler aggregate, plus the buffer and playback loops that
//! drive it
//!
//! A [`Pipeline`] is constructed once per `Ready` session. Two independent
//! loops run against it: [`buffer_loop::BufferLoop`] decodes frames into its
//! buffer(s), and [`playback_loop::PlaybackLoop`] drains them through the
//! sampler and/or attached renderer. Both loops share the same
//! start/stop/close lifecycle and handler shape so the controller can treat
//! them uniformly.

#![warn(missing_docs)]
#![deny(unsafe_code)]

mod buffer_loop;
mod pipeline;
mod playback_loop;
mod sync;

#[cfg(test)]
mod test_support;

pub use buffer_loop::{BufferLoop, EndOfMediaHandler, ExceptionHandler, TimestampHandler};
pub use pipeline::{AudioPipeline, AudioVideoPipeline, Pipeline, VideoPipeline};
pub use playback_loop::{PlaybackLoop, RendererSlot};
pub use sync::{sync_decision, SyncDecision, SYNC_THRESHOLD};
