//! The controller's command surface

use std::time::Duration;

/// A state-mutating operation accepted by [`crate::PlayerController::execute`].
///
/// Every command is serialized behind the controller's command lock.
/// Arriving in a status its transition doesn't apply to is a silent no-op
/// (documented per-variant below) rather than an error, reconciling fast
/// user input against a possibly-transitioning session.
#[derive(Debug, Clone)]
pub enum Command {
    /// Probes `location` and constructs a pipeline sized to the given
    /// buffer capacities. Only takes effect from `Empty`.
    Prepare {
        /// Location to probe and decode.
        location: String,
        /// Capacity of the audio bounded buffer, used if the media has
        /// audio.
        audio_buffer_size: usize,
        /// Capacity of the video bounded buffer, used if the media has
        /// video.
        video_buffer_size: usize,
        /// Ranked hardware-acceleration preferences passed through to video
        /// decoder construction, if the media has video. Negotiating among
        /// them is the decoder's concern; the core only plumbs the list
        /// through.
        hardware_acceleration_candidates: Vec<String>,
    },
    /// Starts playback. Only takes effect from `STOPPED`.
    Play,
    /// Pauses playback, leaving the buffer loop running. Only takes effect
    /// from `PLAYING`.
    Pause,
    /// Resumes playback. Only takes effect from `PAUSED`.
    Resume,
    /// Stops playback and resets decode state. Takes effect from
    /// `PLAYING`/`PAUSED`/`COMPLETED`/`SEEKING`.
    Stop,
    /// Seeks to `timestamp`, ending in `PAUSED`. Takes effect from any
    /// `Ready` status.
    SeekTo {
        /// Target presentation timestamp.
        timestamp: Duration,
        /// Request landing on the nearest keyframe rather than decoding
        /// forward to the exact timestamp.
        keyframes_only: bool,
    },
    /// Tears down the current session, if any. A no-op from `Empty`.
    Release,
}
