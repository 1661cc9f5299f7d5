//! Error types shared across the playback engine
//!
//! This module defines the error taxonomy described by the engine's error
//! handling design: setup failures, runtime loop failures, and contract
//! violations all flow through [`MediaError`].

use thiserror::Error;

/// Errors that can occur while preparing, running, or tearing down a
/// playback session.
///
/// # Examples
///
/// ```
/// use mediacore_types::MediaError;
///
/// let error = MediaError::ProbeFailed {
///     location: "file:///clip.mp4".to_string(),
///     details: "unrecognized container".to_string(),
/// };
/// println!("{error}");
/// ```
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MediaError {
    /// Probing the media source failed during `Prepare`.
    #[error("failed to probe '{location}': {details}")]
    ProbeFailed {
        /// The location that was probed.
        location: String,
        /// Details of the probe failure.
        details: String,
    },

    /// Constructing a decoder, sampler, buffer, or pool failed during `Prepare`.
    #[error("pipeline construction failed: {details}")]
    ConstructionFailed {
        /// Details of the construction failure.
        details: String,
    },

    /// A decoder reported a failure while the buffer loop was running.
    #[error("decoder error: {details}")]
    DecoderError {
        /// Details of the decoder failure.
        details: String,
    },

    /// The sampler reported a failure while the playback loop was running.
    #[error("sampler error: {details}")]
    SamplerError {
        /// Details of the sampler failure.
        details: String,
    },

    /// The renderer reported a failure while presenting a video frame.
    #[error("renderer error: {details}")]
    RendererError {
        /// Details of the renderer failure.
        details: String,
    },

    /// A buffer loop run failed and was wrapped for asynchronous delivery.
    #[error("buffer loop failed: {0}")]
    BufferLoopException(Box<MediaError>),

    /// A playback loop run failed and was wrapped for asynchronous delivery.
    #[error("playback loop failed: {0}")]
    PlaybackLoopException(Box<MediaError>),

    /// A bounded frame buffer operation was attempted after `close()`.
    #[error("buffer is closed")]
    BufferClosed,

    /// A frame-data pool operation was attempted after `close()`.
    #[error("pool is closed")]
    PoolClosed,

    /// `attachRenderer` was called while a renderer was already attached.
    #[error("a renderer is already attached")]
    RendererAlreadyAttached,

    /// `changeSettings` was called with a value outside the allowed range.
    #[error("invalid settings value: {details}")]
    InvalidSettings {
        /// Details of which field was invalid and why.
        details: String,
    },

    /// A command was rejected because the controller is not in a state that
    /// can service it. Most disallowed transitions are silent no-ops per the
    /// state table; this variant is reserved for cases that must fail loudly
    /// (e.g. playback commands issued while `Empty`).
    #[error("invalid state: {details}")]
    InvalidState {
        /// Details of the invalid state.
        details: String,
    },
}

/// Result alias used throughout the engine.
pub type MediaResult<T> = Result<T, MediaError>;
