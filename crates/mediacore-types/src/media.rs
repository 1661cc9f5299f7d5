//! Media description types
//!
//! A [`Media`] value is produced by a decoder's `probe` call during
//! `Prepare` and describes the shape of the content the pipeline must be
//! built around.

use std::time::Duration;

/// Audio stream parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioFormat {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Number of interleaved channels.
    pub channels: u8,
}

/// Video stream parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoFormat {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Nominal frame rate in frames per second.
    pub frame_rate: f64,
    /// Bytes required to hold one decoded frame; sizes the frame-data pool.
    pub buffer_capacity: usize,
}

/// The shape of a probed media source.
///
/// Every variant carries a non-negative `duration`. Media whose duration is
/// zero is [`Media::is_continuous`] == `false`: it is a valid media value but
/// cannot be played, paused, or seeked.
#[derive(Debug, Clone, PartialEq)]
pub enum Media {
    /// Audio-only media.
    Audio {
        /// Total duration.
        duration: Duration,
        /// Audio stream parameters.
        format: AudioFormat,
    },
    /// Video-only media.
    Video {
        /// Total duration.
        duration: Duration,
        /// Video stream parameters.
        video_format: VideoFormat,
    },
    /// Media carrying both an audio and a video stream.
    AudioVideo {
        /// Total duration.
        duration: Duration,
        /// Audio stream parameters.
        format: AudioFormat,
        /// Video stream parameters.
        video_format: VideoFormat,
    },
}

impl Media {
    /// Returns the media's total duration.
    pub fn duration(&self) -> Duration {
        match self {
            Media::Audio { duration, .. }
            | Media::Video { duration, .. }
            | Media::AudioVideo { duration, .. } => *duration,
        }
    }

    /// A media is continuous when its duration is strictly positive.
    /// Non-continuous media (e.g. a single-image stream) is valid but
    /// playback commands on it are no-ops.
    pub fn is_continuous(&self) -> bool {
        self.duration() > Duration::ZERO
    }

    /// Whether this media carries an audio stream.
    pub fn has_audio(&self) -> bool {
        matches!(self, Media::Audio { .. } | Media::AudioVideo { .. })
    }

    /// Whether this media carries a video stream.
    pub fn has_video(&self) -> bool {
        matches!(self, Media::Video { .. } | Media::AudioVideo { .. })
    }
}
