//! Observable playback status and top-level player state

use crate::media::Media;

/// Status of a `Ready` session.
///
/// `TRANSITION` is a short-lived status set while a command is in flight
/// between two stable statuses; it is never the terminal status of a
/// completed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    /// A command is currently being applied; side effects are in flight.
    Transition,
    /// Frames are flowing to the sampler/renderer on the wall clock.
    Playing,
    /// Playback is halted; the buffer loop may still be running.
    Paused,
    /// Both loops are stopped and buffers/pool/decoders have been reset.
    Stopped,
    /// Both streams reached end-of-stream during playback.
    Completed,
    /// A seek is in flight; ends in `Paused`.
    Seeking,
    /// The session is being torn down.
    Releasing,
}

/// The player controller's externally observable state.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerState {
    /// No media loaded.
    Empty,
    /// `Prepare` is probing the source and constructing the pipeline.
    Preparing,
    /// A pipeline is owned and ready to be commanded.
    Ready {
        /// The media that was probed.
        media: Media,
        /// Current playback status.
        status: PlaybackStatus,
    },
}

impl PlayerState {
    /// The current [`PlaybackStatus`], if `Ready`.
    pub fn status(&self) -> Option<PlaybackStatus> {
        match self {
            PlayerState::Ready { status, .. } => Some(*status),
            _ => None,
        }
    }
}
