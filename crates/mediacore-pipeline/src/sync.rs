//! Audio/video synchronization decisions for the playback loop
//!
//! Grounded on the teacher workspace's `AVSyncController`: audio drives the
//! master clock, video frames are compared against it, and frames more than
//! [`SYNC_THRESHOLD`] behind the clock are dropped while frames more than
//! the threshold ahead wait.

use std::time::Duration;

/// Bound on how far a video frame's timestamp may diverge from the audio
/// clock before the playback loop drops it (too late) or waits for it (too
/// early). The spec leaves the exact tolerance as an open question; this
/// crate fixes it at the teacher workspace's `AVSyncController` default.
pub const SYNC_THRESHOLD: Duration = Duration::from_millis(40);

/// What the playback loop should do with a video frame, given the current
/// position of the audio master clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDecision {
    /// Present the frame now.
    Display,
    /// The frame is too far behind the audio clock; drop it (returning its
    /// backing block to the pool) without presenting it.
    Drop,
    /// The frame is too far ahead; wait this long before presenting it.
    Wait {
        /// How long to wait before the frame is due.
        duration: Duration,
    },
}

/// Decides what to do with a video frame timestamped `video_timestamp`,
/// given the audio clock is currently at `audio_timestamp`.
pub fn sync_decision(video_timestamp: Duration, audio_timestamp: Duration) -> SyncDecision {
    if video_timestamp >= audio_timestamp {
        let ahead_by = video_timestamp - audio_timestamp;
        if ahead_by <= SYNC_THRESHOLD {
            SyncDecision::Display
        } else {
            SyncDecision::Wait { duration: ahead_by }
        }
    } else {
        let behind_by = audio_timestamp - video_timestamp;
        if behind_by > SYNC_THRESHOLD {
            SyncDecision::Drop
        } else {
            SyncDecision::Display
        }
    }
}
