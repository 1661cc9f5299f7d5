//! In-memory prober/factory/decoder/sampler/renderer doubles shared by this
//! crate's tests

use async_trait::async_trait;
use mediacore_types::{
    AudioDecoder, AudioFormat, Frame, Media, MediaError, MediaProber, MediaResult, PipelineFactory,
    RawVideoData, Renderer, Sampler, VideoDecodeOutcome, VideoDecoder, VideoFormat,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Always probes to the `media` it was constructed with, regardless of the
/// requested location or `find_audio`/`find_video` flags.
pub struct MockProber {
    media: Media,
}

impl MockProber {
    /// A prober that reports a continuous audio-only media.
    pub fn audio(duration: Duration) -> Self {
        Self {
            media: Media::Audio {
                duration,
                format: AudioFormat {
                    sample_rate: 48_000,
                    channels: 2,
                },
            },
        }
    }

    /// A prober that reports a continuous audio+video media.
    pub fn audio_video(duration: Duration) -> Self {
        Self {
            media: Media::AudioVideo {
                duration,
                format: AudioFormat {
                    sample_rate: 48_000,
                    channels: 2,
                },
                video_format: VideoFormat {
                    width: 16,
                    height: 16,
                    frame_rate: 30.0,
                    buffer_capacity: 16 * 16 * 3 / 2,
                },
            },
        }
    }

    /// A prober that reports a video-only media.
    pub fn video(duration: Duration) -> Self {
        Self {
            media: Media::Video {
                duration,
                video_format: VideoFormat {
                    width: 16,
                    height: 16,
                    frame_rate: 30.0,
                    buffer_capacity: 16 * 16 * 3 / 2,
                },
            },
        }
    }

    /// A prober that always fails, simulating an unreadable location.
    pub fn failing() -> FailingProber {
        FailingProber
    }
}

#[async_trait]
impl MediaProber for MockProber {
    async fn probe(&self, _location: &str, _find_audio: bool, _find_video: bool) -> MediaResult<Media> {
        Ok(self.media.clone())
    }
}

/// A prober that always fails probing.
pub struct FailingProber;

#[async_trait]
impl MediaProber for FailingProber {
    async fn probe(&self, location: &str, _find_audio: bool, _find_video: bool) -> MediaResult<Media> {
        Err(MediaError::ProbeFailed {
            location: location.to_string(),
            details: "simulated probe failure".to_string(),
        })
    }
}

/// A prober that sleeps for `delay` before reporting `media`, simulating a
/// slow probe a concurrent `Release` can interrupt.
pub struct SlowProber {
    media: Media,
    delay: Duration,
}

impl SlowProber {
    /// Reports a continuous audio-only media after `delay`.
    pub fn audio(duration: Duration, delay: Duration) -> Self {
        Self {
            media: Media::Audio {
                duration,
                format: AudioFormat {
                    sample_rate: 48_000,
                    channels: 2,
                },
            },
            delay,
        }
    }
}

#[async_trait]
impl MediaProber for SlowProber {
    async fn probe(&self, _location: &str, _find_audio: bool, _find_video: bool) -> MediaResult<Media> {
        tokio::time::sleep(self.delay).await;
        Ok(self.media.clone())
    }
}

/// Builds the mock decoders/sampler this module provides, counting how many
/// frames each constructed decoder emits before ending.
#[derive(Default)]
pub struct MockPipelineFactory {
    frame_count: usize,
    video_fails_at: Option<usize>,
}

impl MockPipelineFactory {
    /// A factory whose decoders each emit `frame_count` frames before
    /// signaling end-of-stream.
    pub fn with_frame_count(frame_count: usize) -> Self {
        Self {
            frame_count,
            video_fails_at: None,
        }
    }

    /// A factory whose video decoder fails on its `index`-th `decode_video`
    /// call instead of ever reaching end-of-stream, simulating a runtime
    /// decoder failure while `PLAYING`.
    pub fn with_video_failing_at(index: usize) -> Self {
        Self {
            frame_count: 0,
            video_fails_at: Some(index),
        }
    }
}

#[async_trait]
impl PipelineFactory for MockPipelineFactory {
    async fn create_audio_decoder(&self, _location: &str) -> MediaResult<Box<dyn AudioDecoder>> {
        Ok(Box::new(MockAudioDecoder::with_frame_count(self.frame_count)))
    }

    async fn create_video_decoder(
        &self,
        _location: &str,
        _hardware_acceleration_candidates: &[String],
    ) -> MediaResult<Box<dyn VideoDecoder>> {
        match self.video_fails_at {
            Some(index) => Ok(Box::new(MockVideoDecoder::failing_after(index))),
            None => Ok(Box::new(MockVideoDecoder::with_frame_count(self.frame_count))),
        }
    }

    async fn create_sampler(&self) -> MediaResult<Box<dyn Sampler>> {
        Ok(Box::new(MockSampler::default()))
    }
}

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
