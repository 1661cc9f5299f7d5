//! Drives decoder(s), filling the pipeline's bounded buffer(s)
//!
//! One [`BufferLoop`] is spawned per `Ready` session. Its `start`/`stop`/
//! `close` lifecycle mirrors the coroutine-driven-loop mapping in §9: an
//! owned task handle plus a cancellation token, `stop` cancels and joins,
//! `close` cancels without awaiting.

use crate::pipeline::Pipeline;
use mediacore_types::{Frame, MediaError, MediaResult, VideoDecodeOutcome};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

/// Called with the cause whenever the loop's run fails. Invoked on a fresh
/// task so a failure never synchronously propagates into the caller of
/// `start`.
pub type ExceptionHandler = Arc<dyn Fn(MediaError) + Send + Sync>;
/// Called with each strictly-increasing buffer timestamp as frames are
/// enqueued.
pub type TimestampHandler = Arc<dyn Fn(Duration) + Send + Sync>;
/// Called once, after the loop runs to completion (all relevant streams
/// reached end-of-stream).
pub type EndOfMediaHandler = Arc<dyn Fn() + Send + Sync>;

struct Inner {
    pipeline: Arc<Pipeline>,
    is_buffering: AtomicBool,
    cancel: parking_lot::Mutex<Option<CancellationToken>>,
    handle: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

/// Decodes frames and enqueues them into the pipeline's buffer(s).
#[derive(Clone)]
pub struct BufferLoop {
    inner: Arc<Inner>,
}

impl BufferLoop {
    /// Creates a buffer loop over `pipeline`. The loop does not start
    /// running until [`BufferLoop::start`] is called.
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self {
            inner: Arc::new(Inner {
                pipeline,
                is_buffering: AtomicBool::new(false),
                cancel: parking_lot::Mutex::new(None),
                handle: parking_lot::Mutex::new(None),
            }),
        }
    }

    /// Whether the loop's task is currently running.
    pub fn is_buffering(&self) -> bool {
        self.inner.is_buffering.load(Ordering::Acquire)
    }

    /// Starts decoding. Fails if the loop is already buffering.
    pub fn start(
        &self,
        on_exception: ExceptionHandler,
        on_timestamp: TimestampHandler,
        on_end_of_media: EndOfMediaHandler,
    ) -> MediaResult<()> {
        if self.inner.is_buffering.swap(true, Ordering::AcqRel) {
            return Err(MediaError::InvalidState {
                details: "buffer loop is already running".to_string(),
            });
        }

        let cancel = CancellationToken::new();
        *self.inner.cancel.lock() = Some(cancel.clone());

        let inner = self.inner.clone();
        let pipeline = self.inner.pipeline.clone();
        let handle = tokio::spawn(async move {
            info!("buffer loop started");
            run(pipeline, cancel, on_exception, on_timestamp, on_end_of_media).await;
            inner.is_buffering.store(false, Ordering::Release);
            debug!("buffer loop exited");
        });
        *self.inner.handle.lock() = Some(handle);
        Ok(())
    }

    /// Cancels the running task and waits for it to terminate.
    pub async fn stop(&self) {
        if let Some(cancel) = self.inner.cancel.lock().take() {
            cancel.cancel();
        }
        let handle = self.inner.handle.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// Cancels the running task without waiting for it. Idempotent.
    pub fn close(&self) {
        if let Some(cancel) = self.inner.cancel.lock().take() {
            cancel.cancel();
        }
        self.inner.handle.lock().take();
    }
}

async fn run(
    pipeline: Arc<Pipeline>,
    cancel: CancellationToken,
    on_exception: ExceptionHandler,
    on_timestamp: TimestampHandler,
    on_end_of_media: EndOfMediaHandler,
) {
    match &*pipeline {
        Pipeline::Audio(p) => {
            run_audio_track(
                &p.decoder,
                &p.buffer,
                &cancel,
                &on_exception,
                &on_timestamp,
            )
            .await;
            if !cancel.is_cancelled() {
                on_end_of_media();
            }
        }
        Pipeline::Video(p) => {
            run_video_track(
                &p.decoder,
                &p.pool,
                &p.buffer,
                &cancel,
                &on_exception,
                &on_timestamp,
            )
            .await;
            if !cancel.is_cancelled() {
                on_end_of_media();
            }
        }
        Pipeline::AudioVideo(p) => {
            let last_reported_nanos = Arc::new(AtomicU64::new(0));
            let audio_fut = run_audio_track_coalesced(
                &p.audio_decoder,
                &p.audio_buffer,
                &cancel,
                &on_exception,
                &on_timestamp,
                &last_reported_nanos,
            );
            let video_fut = run_video_track_coalesced(
                &p.video_decoder,
                &p.video_pool,
                &p.video_buffer,
                &cancel,
                &on_exception,
                &on_timestamp,
                &last_reported_nanos,
            );
            let (audio_finished, video_finished) = tokio::join!(audio_fut, video_fut);
            if audio_finished && video_finished {
                on_end_of_media();
            }
        }
    }
}

/// Reports `ts` only if strictly greater than the last reported timestamp,
/// atomically. Returns whether it was reported.
fn report_if_greater(last_reported_nanos: &AtomicU64, ts: Duration) -> bool {
    let nanos = ts.as_nanos().min(u64::MAX as u128) as u64;
    loop {
        let current = last_reported_nanos.load(Ordering::Acquire);
        if nanos <= current {
            return false;
        }
        if last_reported_nanos
            .compare_exchange(current, nanos, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            return true;
        }
    }
}

async fn run_audio_track(
    decoder: &tokio::sync::Mutex<Box<dyn mediacore_types::AudioDecoder>>,
    buffer: &mediacore_buffer::BoundedFrameBuffer<Frame>,
    cancel: &CancellationToken,
    on_exception: &ExceptionHandler,
    on_timestamp: &TimestampHandler,
) {
    loop {
        if cancel.is_cancelled() {
            return;
        }
        let decoded = decoder.lock().await.decode_audio().await;
        match decoded {
            Ok(Frame::EndOfStream) => {
                let _ = put_cancellable(buffer, Frame::EndOfStream, cancel).await;
                return;
            }
            Ok(frame) => {
                let ts = frame.timestamp();
                if put_cancellable(buffer, frame, cancel).await.is_err() {
                    return;
                }
                tokio::task::yield_now().await;
                if cancel.is_cancelled() {
                    return;
                }
                if let Some(ts) = ts {
                    on_timestamp(ts);
                }
            }
            Err(err) => {
                on_exception(MediaError::BufferLoopException(Box::new(err)));
                return;
            }
        }
    }
}

async fn run_video_track(
    decoder: &tokio::sync::Mutex<Box<dyn mediacore_types::VideoDecoder>>,
    pool: &mediacore_buffer::Pool,
    buffer: &mediacore_buffer::BoundedFrameBuffer<Frame>,
    cancel: &CancellationToken,
    on_exception: &ExceptionHandler,
    on_timestamp: &TimestampHandler,
) {
    loop {
        if cancel.is_cancelled() {
            return;
        }
        let mut block = match acquire_cancellable(pool, cancel).await {
            Some(block) => block,
            None => return,
        };
        let decoded = decoder.lock().await.decode_video(&mut block).await;
        match decoded {
            Ok(VideoDecodeOutcome::EndOfStream) => {
                pool.release(block);
                let _ = put_cancellable(buffer, Frame::EndOfStream, cancel).await;
                return;
            }
            Ok(VideoDecodeOutcome::Decoded { timestamp }) => {
                let frame = Frame::Video {
                    timestamp,
                    data: block,
                };
                if put_cancellable(buffer, frame, cancel).await.is_err() {
                    return;
                }
                tokio::task::yield_now().await;
                if cancel.is_cancelled() {
                    return;
                }
                on_timestamp(timestamp);
            }
            Err(err) => {
                // Spec: release the acquired block before surfacing the failure.
                pool.release(block);
                on_exception(MediaError::BufferLoopException(Box::new(err)));
                return;
            }
        }
    }
}

async fn run_audio_track_coalesced(
    decoder: &tokio::sync::Mutex<Box<dyn mediacore_types::AudioDecoder>>,
    buffer: &mediacore_buffer::BoundedFrameBuffer<Frame>,
    cancel: &CancellationToken,
    on_exception: &ExceptionHandler,
    on_timestamp: &TimestampHandler,
    last_reported_nanos: &AtomicU64,
) -> bool {
    loop {
        if cancel.is_cancelled() {
            return false;
        }
        let decoded = decoder.lock().await.decode_audio().await;
        match decoded {
            Ok(Frame::EndOfStream) => {
                let delivered = put_cancellable(buffer, Frame::EndOfStream, cancel).await.is_ok();
                trace!("audio track reached end-of-stream");
                return delivered;
            }
            Ok(frame) => {
                let ts = frame.timestamp();
                if put_cancellable(buffer, frame, cancel).await.is_err() {
                    return false;
                }
                tokio::task::yield_now().await;
                if cancel.is_cancelled() {
                    return false;
                }
                if let Some(ts) = ts {
                    if report_if_greater(last_reported_nanos, ts) {
                        on_timestamp(ts);
                    }
                }
            }
            Err(err) => {
                on_exception(MediaError::BufferLoopException(Box::new(err)));
                return false;
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_video_track_coalesced(
    decoder: &tokio::sync::Mutex<Box<dyn mediacore_types::VideoDecoder>>,
    pool: &mediacore_buffer::Pool,
    buffer: &mediacore_buffer::BoundedFrameBuffer<Frame>,
    cancel: &CancellationToken,
    on_exception: &ExceptionHandler,
    on_timestamp: &TimestampHandler,
    last_reported_nanos: &AtomicU64,
) -> bool {
    loop {
        if cancel.is_cancelled() {
            return false;
        }
        let mut block = match acquire_cancellable(pool, cancel).await {
            Some(block) => block,
            None => return false,
        };
        let decoded = decoder.lock().await.decode_video(&mut block).await;
        match decoded {
            Ok(VideoDecodeOutcome::EndOfStream) => {
                pool.release(block);
                let delivered = put_cancellable(buffer, Frame::EndOfStream, cancel).await.is_ok();
                trace!("video track reached end-of-stream");
                return delivered;
            }
            Ok(VideoDecodeOutcome::Decoded { timestamp }) => {
                let frame = Frame::Video {
                    timestamp,
                    data: block,
                };
                if put_cancellable(buffer, frame, cancel).await.is_err() {
                    return false;
                }
                tokio::task::yield_now().await;
                if cancel.is_cancelled() {
                    return false;
                }
                if report_if_greater(last_reported_nanos, timestamp) {
                    on_timestamp(timestamp);
                }
            }
            Err(err) => {
                pool.release(block);
                on_exception(MediaError::BufferLoopException(Box::new(err)));
                return false;
            }
        }
    }
}

async fn put_cancellable(
    buffer: &mediacore_buffer::BoundedFrameBuffer<Frame>,
    frame: Frame,
    cancel: &CancellationToken,
) -> Result<(), ()> {
    tokio::select! {
        _ = cancel.cancelled() => Err(()),
        result = buffer.put(frame) => result.map_err(|_| ()),
    }
}

async fn acquire_cancellable(
    pool: &mediacore_buffer::Pool,
    cancel: &CancellationToken,
) -> Option<mediacore_types::RawVideoData> {
    tokio::select! {
        _ = cancel.cancelled() => None,
        result = pool.acquire() => result.ok(),
    }
}
