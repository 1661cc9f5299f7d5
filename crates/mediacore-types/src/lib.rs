//! # mediacore-types
//!
//! Shared data model, error taxonomy, and collaborator contracts for the
//! mediacore playback engine.
//!
//! This crate defines the vocabulary every other mediacore crate builds on:
//!
//! - [`Media`], [`AudioFormat`], [`VideoFormat`] — what was probed.
//! - [`Frame`], [`RawVideoData`] — the unit decoders hand to buffers.
//! - [`MediaError`] — the error taxonomy (setup, runtime, contract violation).
//! - [`Settings`] — volume/mute/speed, validated at the boundary.
//! - [`PlaybackStatus`], [`PlayerState`] — the controller's observable state.
//! - [`PlayerEvent`] — what flows over the event bus.
//! - [`AudioDecoder`], [`VideoDecoder`], [`MediaProber`], [`PipelineFactory`],
//!   [`Sampler`], [`Renderer`] — the out-of-scope collaborator contracts the
//!   core is specified against.

#![warn(missing_docs)]
#![deny(unsafe_code)]

mod errors;
mod events;
mod frame;
mod media;
mod settings;
mod status;
mod traits;

pub use errors::{MediaError, MediaResult};
pub use events::PlayerEvent;
pub use frame::{Frame, RawVideoData};
pub use media::{AudioFormat, Media, VideoFormat};
pub use settings::{Settings, MAX_PLAYBACK_SPEED_FACTOR, MIN_PLAYBACK_SPEED_FACTOR};
pub use status::{PlaybackStatus, PlayerState};
pub use traits::{
    AudioDecoder, MediaProber, PipelineFactory, Renderer, Sampler, VideoDecoder, VideoDecodeOutcome,
};
