//! In-memory decoder/sampler/renderer doubles shared by this crate's tests

use async_trait::async_trait;
use mediacore_types::{
    AudioDecoder, Frame, MediaError, MediaResult, RawVideoData, Renderer, Sampler, VideoDecodeOutcome,
    VideoDecoder,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Emits `frame_count` audio frames spaced 10ms apart, then end-of-stream.
pub struct MockAudioDecoder {
    emitted: AtomicUsize,
    frame_count: usize,
}

impl MockAudioDecoder {
    /// Creates a decoder that emits `frame_count` frames before ending.
    pub fn with_frame_count(frame_count: usize) -> Self {
        Self {
            emitted: AtomicUsize::new(0),
            frame_count,
        }
    }
}

#[async_trait]
impl AudioDecoder for MockAudioDecoder {
    async fn decode_audio(&mut self) -> MediaResult<Frame> {
        let index = self.emitted.fetch_add(1, Ordering::SeqCst);
        if index >= self.frame_count {
            return Ok(Frame::EndOfStream);
        }
        Ok(Frame::Audio {
            timestamp: Duration::from_millis(10 * (index as u64 + 1)),
            bytes: vec![0.0; 4],
        })
    }

    async fn seek_to(&mut self, timestamp: Duration, _keyframes_only: bool) -> MediaResult<Duration> {
        Ok(timestamp)
    }

    async fn reset(&mut self) -> MediaResult<()> {
        self.emitted.store(0, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&mut self) -> MediaResult<()> {
        Ok(())
    }
}

/// Emits `frame_count` video frames spaced 10ms apart, then end-of-stream.
/// If constructed via [`MockVideoDecoder::failing_after`], fails on the
/// `fail_at`-th decode instead of ever reaching end-of-stream.
pub struct MockVideoDecoder {
    emitted: AtomicUsize,
    frame_count: usize,
    fail_at: Option<usize>,
}

impl MockVideoDecoder {
    /// Creates a decoder that emits `frame_count` frames before ending.
    pub fn with_frame_count(frame_count: usize) -> Self {
        Self {
            emitted: AtomicUsize::new(0),
            frame_count,
            fail_at: None,
        }
    }

    /// Creates a decoder that fails on the `index`-th call to `decode_video`.
    pub fn failing_after(index: usize) -> Self {
        Self {
            emitted: AtomicUsize::new(0),
            frame_count: usize::MAX,
            fail_at: Some(index),
        }
    }
}

#[async_trait]
impl VideoDecoder for MockVideoDecoder {
    async fn decode_video(&mut self, _dest: &mut RawVideoData) -> MediaResult<VideoDecodeOutcome> {
        let index = self.emitted.fetch_add(1, Ordering::SeqCst);
        if Some(index) == self.fail_at {
            return Err(MediaError::DecoderError {
                details: "simulated decode failure".to_string(),
            });
        }
        if index >= self.frame_count {
            return Ok(VideoDecodeOutcome::EndOfStream);
        }
        Ok(VideoDecodeOutcome::Decoded {
            timestamp: Duration::from_millis(10 * (index as u64 + 1)),
        })
    }

    async fn seek_to(&mut self, timestamp: Duration, _keyframes_only: bool) -> MediaResult<Duration> {
        Ok(timestamp)
    }

    async fn reset(&mut self) -> MediaResult<()> {
        self.emitted.store(0, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&mut self) -> MediaResult<()> {
        Ok(())
    }
}

/// Discards every write; records nothing beyond call counts.
#[derive(Default)]
pub struct MockSampler {
    writes: AtomicUsize,
}

impl MockSampler {
    /// Number of samples written so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sampler for MockSampler {
    async fn start(&mut self) -> MediaResult<()> {
        Ok(())
    }

    async fn stop(&mut self) -> MediaResult<()> {
        Ok(())
    }

    async fn flush(&mut self) -> MediaResult<()> {
        Ok(())
    }

    async fn close(&mut self) -> MediaResult<()> {
        Ok(())
    }

    async fn write(&mut self, _samples: &[f32], _gain: f32, _speed: f32) -> MediaResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands the block straight back, recording the timestamps it was asked to
/// present.
#[derive(Default)]
pub struct MockRenderer {
    presented: std::sync::Mutex<Vec<Duration>>,
}

impl MockRenderer {
    /// Timestamps presented so far, in order.
    pub fn presented(&self) -> Vec<Duration> {
        self.presented.lock().unwrap().clone()
    }
}

#[async_trait]
impl Renderer for MockRenderer {
    async fn present(&mut self, timestamp: Duration, data: RawVideoData) -> MediaResult<RawVideoData> {
        self.presented.lock().unwrap().push(timestamp);
        Ok(data)
    }
}
