//! Collaborator contracts
//!
//! These traits are the boundary the core is specified against: concrete
//! decoders, samplers, renderers and probers are out of scope for this
//! crate and are supplied by the embedder. Each trait mirrors one row of
//! the "External Interfaces" section: the core only ever calls through
//! these interfaces, never constructs a concrete codec itself.

use crate::errors::MediaResult;
use crate::frame::{Frame, RawVideoData};
use async_trait::async_trait;
use std::time::Duration;

/// Outcome of a single `decode_video` call.
///
/// Kept distinct from [`Frame`] because the caller must know whether to
/// release the block it handed in (`EndOfStream`) or move it into a `Frame`
/// it enqueues (`Decoded`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoDecodeOutcome {
    /// A frame was decoded into the block at the given timestamp.
    Decoded {
        /// Presentation timestamp of the decoded frame.
        timestamp: Duration,
    },
    /// The video stream has no more frames; the block was left untouched.
    EndOfStream,
}

/// Decodes one audio stream.
#[async_trait]
pub trait AudioDecoder: Send + Sync {
    /// Decodes the next audio frame, or returns `Frame::EndOfStream` once
    /// the stream is exhausted.
    async fn decode_audio(&mut self) -> MediaResult<Frame>;

    /// Seeks to `timestamp`, returning the actual timestamp landed on.
    /// `keyframes_only` requests landing on the nearest keyframe rather
    /// than decoding forward to the exact timestamp.
    async fn seek_to(&mut self, timestamp: Duration, keyframes_only: bool) -> MediaResult<Duration>;

    /// Resets internal decode state without releasing resources, used after
    /// `Stop`.
    async fn reset(&mut self) -> MediaResult<()>;

    /// Releases all resources. Idempotent.
    async fn close(&mut self) -> MediaResult<()>;
}

/// Decodes one video stream.
#[async_trait]
pub trait VideoDecoder: Send + Sync {
    /// Decodes the next video frame into `dest`, a block acquired from the
    /// frame-data pool. On `EndOfStream`, `dest` is left untouched and is
    /// the caller's responsibility to release.
    async fn decode_video(&mut self, dest: &mut RawVideoData) -> MediaResult<VideoDecodeOutcome>;

    /// Seeks to `timestamp`, returning the actual timestamp landed on.
    async fn seek_to(&mut self, timestamp: Duration, keyframes_only: bool) -> MediaResult<Duration>;

    /// Resets internal decode state without releasing resources, used after
    /// `Stop`.
    async fn reset(&mut self) -> MediaResult<()>;

    /// Releases all resources. Idempotent.
    async fn close(&mut self) -> MediaResult<()>;
}

/// Probes a media location to determine its shape before a pipeline is
/// constructed. Modeled as an injected collaborator (rather than a `static`
/// method) so the controller can be driven against a test double.
#[async_trait]
pub trait MediaProber: Send + Sync {
    /// Probes `location`, looking for an audio and/or video stream as
    /// requested by `find_audio`/`find_video`.
    async fn probe(
        &self,
        location: &str,
        find_audio: bool,
        find_video: bool,
    ) -> MediaResult<crate::media::Media>;
}

/// Presents decoded audio, with its own wall-clock-pacing clock.
#[async_trait]
pub trait Sampler: Send + Sync {
    /// Starts the audio output device/stream.
    async fn start(&mut self) -> MediaResult<()>;

    /// Stops the audio output device/stream without discarding buffered
    /// audio.
    async fn stop(&mut self) -> MediaResult<()>;

    /// Discards any buffered audio.
    async fn flush(&mut self) -> MediaResult<()>;

    /// Releases all resources. Idempotent.
    async fn close(&mut self) -> MediaResult<()>;

    /// Blocking write of one audio frame's samples, at the given `gain`
    /// (`0.0` when muted) and `speed` (the current
    /// `playback_speed_factor`).
    async fn write(&mut self, samples: &[f32], gain: f32, speed: f32) -> MediaResult<()>;
}

/// Presentation sink for video frames.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Presents one decoded video frame, swapping it in atomically. Returns
    /// the backing block so the caller can release it to the frame-data
    /// pool.
    async fn present(&mut self, timestamp: Duration, data: RawVideoData) -> MediaResult<RawVideoData>;
}

/// Constructs the decoder(s) and sampler a prepared pipeline is built from,
/// once a [`crate::media::Media`] has been probed.
///
/// Kept separate from [`MediaProber`] because probing and construction are
/// different collaborators in most embedders (probing often runs ahead of
/// committing to a concrete decoder backend).
#[async_trait]
pub trait PipelineFactory: Send + Sync {
    /// Builds an audio decoder for `location`.
    async fn create_audio_decoder(&self, location: &str) -> MediaResult<Box<dyn AudioDecoder>>;

    /// Builds a video decoder for `location`. `hardware_acceleration_candidates`
    /// carries the caller's ranked hardware-acceleration preferences, if any
    /// were given to `Prepare`; negotiating among them is the decoder's
    /// concern, not the core's (see the crate's module docs on scope).
    async fn create_video_decoder(
        &self,
        location: &str,
        hardware_acceleration_candidates: &[String],
    ) -> MediaResult<Box<dyn VideoDecoder>>;

    /// Builds a sampler for the audio output device.
    async fn create_sampler(&self) -> MediaResult<Box<dyn Sampler>>;
}
