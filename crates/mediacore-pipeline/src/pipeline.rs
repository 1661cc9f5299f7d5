//! The tagged pipeline aggregate owned by a `Ready` session
//!
//! Constructed by the controller during `Prepare`. The three shapes are
//! deliberately not unified behind a single interface because their
//! resource sets differ (§9 design notes): an audio-only session has no
//! pool, a video-only session has no sampler.

use mediacore_buffer::{BoundedFrameBuffer, BufferConfig, Pool};
use mediacore_types::{AudioDecoder, Frame, MediaError, MediaResult, Sampler, VideoDecoder};
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, warn};

/// Audio-only pipeline: one decoder feeding one buffer, drained by a
/// sampler.
pub struct AudioPipeline {
    /// Decodes the audio stream. Accessed only by the buffer loop.
    pub decoder: AsyncMutex<Box<dyn AudioDecoder>>,
    /// Decoded frames awaiting the playback loop.
    pub buffer: Arc<BoundedFrameBuffer<Frame>>,
    /// Presents decoded audio. Accessed only by the playback loop.
    pub sampler: AsyncMutex<Box<dyn Sampler>>,
}

/// Video-only pipeline: one decoder, backed by a frame-data pool, feeding
/// one buffer.
pub struct VideoPipeline {
    /// Decodes the video stream. Accessed only by the buffer loop.
    pub decoder: AsyncMutex<Box<dyn VideoDecoder>>,
    /// Reusable raw video-frame storage.
    pub pool: Arc<Pool>,
    /// Decoded frames awaiting the playback loop.
    pub buffer: Arc<BoundedFrameBuffer<Frame>>,
}

/// Audio+video pipeline: independent decoders and buffers per stream,
/// sharing one sampler that also drives the A/V master clock.
pub struct AudioVideoPipeline {
    /// Decodes the audio stream. Accessed only by the buffer loop's audio task.
    pub audio_decoder: AsyncMutex<Box<dyn AudioDecoder>>,
    /// Decodes the video stream. Accessed only by the buffer loop's video task.
    pub video_decoder: AsyncMutex<Box<dyn VideoDecoder>>,
    /// Decoded audio frames awaiting the playback loop.
    pub audio_buffer: Arc<BoundedFrameBuffer<Frame>>,
    /// Decoded video frames awaiting the playback loop.
    pub video_buffer: Arc<BoundedFrameBuffer<Frame>>,
    /// Reusable raw video-frame storage.
    pub video_pool: Arc<Pool>,
    /// Presents decoded audio; also the A/V sync master clock.
    pub sampler: AsyncMutex<Box<dyn Sampler>>,
}

/// A tagged aggregate of the decoder(s), buffer(s), optional pool, and
/// optional sampler for one of the three media shapes.
pub enum Pipeline {
    /// Audio-only media.
    Audio(AudioPipeline),
    /// Video-only media.
    Video(VideoPipeline),
    /// Media carrying both an audio and a video stream.
    AudioVideo(AudioVideoPipeline),
}

impl Pipeline {
    /// Builds an audio-only pipeline.
    pub fn new_audio(
        decoder: Box<dyn AudioDecoder>,
        sampler: Box<dyn Sampler>,
        buffer_config: &BufferConfig,
    ) -> Self {
        Pipeline::Audio(AudioPipeline {
            decoder: AsyncMutex::new(decoder),
            buffer: Arc::new(BoundedFrameBuffer::new(buffer_config.audio_buffer_size)),
            sampler: AsyncMutex::new(sampler),
        })
    }

    /// Builds a video-only pipeline. `block_size` is the video format's
    /// `bufferCapacity` (bytes per decoded frame), sizing the pool.
    pub fn new_video(
        decoder: Box<dyn VideoDecoder>,
        block_size: usize,
        buffer_config: &BufferConfig,
    ) -> Self {
        Pipeline::Video(VideoPipeline {
            decoder: AsyncMutex::new(decoder),
            pool: Arc::new(Pool::new(buffer_config.video_pool_capacity, block_size)),
            buffer: Arc::new(BoundedFrameBuffer::new(buffer_config.video_buffer_size)),
        })
    }

    /// Builds an audio+video pipeline.
    pub fn new_audio_video(
        audio_decoder: Box<dyn AudioDecoder>,
        video_decoder: Box<dyn VideoDecoder>,
        sampler: Box<dyn Sampler>,
        block_size: usize,
        buffer_config: &BufferConfig,
    ) -> Self {
        Pipeline::AudioVideo(AudioVideoPipeline {
            audio_decoder: AsyncMutex::new(audio_decoder),
            video_decoder: AsyncMutex::new(video_decoder),
            audio_buffer: Arc::new(BoundedFrameBuffer::new(buffer_config.audio_buffer_size)),
            video_buffer: Arc::new(BoundedFrameBuffer::new(buffer_config.video_buffer_size)),
            video_pool: Arc::new(Pool::new(buffer_config.video_pool_capacity, block_size)),
            sampler: AsyncMutex::new(sampler),
        })
    }

    /// Whether this pipeline has an audio stream.
    pub fn has_audio(&self) -> bool {
        !matches!(self, Pipeline::Video(_))
    }

    /// Whether this pipeline has a video stream.
    pub fn has_video(&self) -> bool {
        !matches!(self, Pipeline::Audio(_))
    }

    /// Releases every owned component in reverse construction order.
    /// Every component is attempted regardless of earlier failures, but the
    /// first error encountered is returned once teardown completes.
    pub async fn close(&self) -> MediaResult<()> {
        let mut first_err: Option<MediaError> = None;
        let mut record = |result: MediaResult<()>| {
            if let Err(err) = result {
                warn!(error = %err, "component close failed during pipeline teardown");
                if first_err.is_none() {
                    first_err = Some(err);
                }
            }
        };

        match self {
            Pipeline::Audio(p) => {
                record(p.sampler.lock().await.close().await);
                p.buffer.close();
                record(p.decoder.lock().await.close().await);
            }
            Pipeline::Video(p) => {
                p.buffer.close();
                p.pool.close();
                record(p.decoder.lock().await.close().await);
            }
            Pipeline::AudioVideo(p) => {
                record(p.sampler.lock().await.close().await);
                p.video_pool.close();
                p.video_buffer.close();
                p.audio_buffer.close();
                record(p.video_decoder.lock().await.close().await);
                record(p.audio_decoder.lock().await.close().await);
            }
        }

        debug!("pipeline closed");
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Starts the sampler, if this pipeline has one.
    pub async fn start_sampler(&self) -> MediaResult<()> {
        match self {
            Pipeline::Audio(p) => p.sampler.lock().await.start().await,
            Pipeline::AudioVideo(p) => p.sampler.lock().await.start().await,
            Pipeline::Video(_) => Ok(()),
        }
    }

    /// Stops the sampler without discarding buffered audio, if this
    /// pipeline has one.
    pub async fn stop_sampler(&self) -> MediaResult<()> {
        match self {
            Pipeline::Audio(p) => p.sampler.lock().await.stop().await,
            Pipeline::AudioVideo(p) => p.sampler.lock().await.stop().await,
            Pipeline::Video(_) => Ok(()),
        }
    }

    /// Discards buffered audio at the sampler, if this pipeline has one.
    pub async fn flush_sampler(&self) -> MediaResult<()> {
        match self {
            Pipeline::Audio(p) => p.sampler.lock().await.flush().await,
            Pipeline::AudioVideo(p) => p.sampler.lock().await.flush().await,
            Pipeline::Video(_) => Ok(()),
        }
    }

    /// Clears both bounded buffers and resets the video pool (if any) and
    /// decoder(s), used by `Stop` and as a step of `SeekTo`. Does not reset
    /// the sampler; callers flush it separately.
    pub async fn clear_and_reset(&self) -> MediaResult<()> {
        match self {
            Pipeline::Audio(p) => {
                p.buffer.clear();
                p.decoder.lock().await.reset().await
            }
            Pipeline::Video(p) => {
                p.buffer.clear();
                p.pool.reset();
                p.decoder.lock().await.reset().await
            }
            Pipeline::AudioVideo(p) => {
                p.audio_buffer.clear();
                p.video_buffer.clear();
                p.video_pool.reset();
                let audio_result = p.audio_decoder.lock().await.reset().await;
                let video_result = p.video_decoder.lock().await.reset().await;
                audio_result.and(video_result)
            }
        }
    }
}
