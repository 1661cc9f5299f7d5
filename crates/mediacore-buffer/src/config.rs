//! Configuration for buffers and the frame-data pool

/// Capacities used when constructing a pipeline's buffers and pool.
///
/// `audio_buffer_size`/`video_buffer_size` become the bounded capacity of
/// the corresponding [`BoundedFrameBuffer`](crate::BoundedFrameBuffer)
/// (a `0` video size on audio-only media, and vice versa, simply means that
/// buffer is never constructed). `video_pool_capacity` sizes the
/// frame-data pool; it is independent of the video buffer's capacity
/// because in-flight frames may be held by the renderer in addition to
/// whatever sits in the buffer.
#[derive(Debug, Clone, Copy)]
pub struct BufferConfig {
    /// Capacity of the audio bounded buffer, in frames.
    pub audio_buffer_size: usize,
    /// Capacity of the video bounded buffer, in frames.
    pub video_buffer_size: usize,
    /// Number of reusable blocks in the frame-data pool.
    pub video_pool_capacity: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            audio_buffer_size: 16,
            video_buffer_size: 8,
            video_pool_capacity: 8,
        }
    }
}
