//! Drains the pipeline's buffer(s), presenting frames through the sampler
//! and/or renderer
//!
//! Audio is the master clock: the sampler's `write` call paces itself
//! against real time, and for an audio+video session the video task
//! compares each frame's timestamp against the last-reported audio
//! timestamp via [`crate::sync::sync_decision`]. A video-only session has
//! no master clock to follow, so it paces itself off the spacing between
//! consecutive decoded timestamps instead.

use crate::buffer_loop::{EndOfMediaHandler, ExceptionHandler, TimestampHandler};
use crate::pipeline::Pipeline;
use crate::sync::{sync_decision, SyncDecision};
use mediacore_types::{Frame, MediaError, RawVideoData, Renderer, Settings};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Shared slot for the attached renderer, swapped independently of whether
/// the playback loop is currently running.
pub type RendererSlot = Arc<AsyncMutex<Option<Box<dyn Renderer>>>>;

struct Inner {
    pipeline: Arc<Pipeline>,
    renderer: RendererSlot,
    settings: watch::Receiver<Settings>,
    is_playing: AtomicBool,
    cancel: parking_lot::Mutex<Option<CancellationToken>>,
    handle: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

/// Presents buffered frames through the sampler and/or the attached
/// renderer.
#[derive(Clone)]
pub struct PlaybackLoop {
    inner: Arc<Inner>,
}

impl PlaybackLoop {
    /// Creates a playback loop over `pipeline`, observing `settings` for the
    /// current volume/mute/speed and presenting video through whatever
    /// renderer is in `renderer` at the time a frame is ready.
    pub fn new(pipeline: Arc<Pipeline>, renderer: RendererSlot, settings: watch::Receiver<Settings>) -> Self {
        Self {
            inner: Arc::new(Inner {
                pipeline,
                renderer,
                settings,
                is_playing: AtomicBool::new(false),
                cancel: parking_lot::Mutex::new(None),
                handle: parking_lot::Mutex::new(None),
            }),
        }
    }

    /// Whether the loop's task is currently running.
    pub fn is_playing(&self) -> bool {
        self.inner.is_playing.load(Ordering::Acquire)
    }

    /// Starts presenting. Fails if the loop is already running.
    pub fn start(
        &self,
        on_exception: ExceptionHandler,
        on_timestamp: TimestampHandler,
        on_end_of_media: EndOfMediaHandler,
    ) -> Result<(), MediaError> {
        if self.inner.is_playing.swap(true, Ordering::AcqRel) {
            return Err(MediaError::InvalidState {
                details: "playback loop is already running".to_string(),
            });
        }

        let cancel = CancellationToken::new();
        *self.inner.cancel.lock() = Some(cancel.clone());

        let inner = self.inner.clone();
        let pipeline = self.inner.pipeline.clone();
        let renderer = self.inner.renderer.clone();
        let settings = self.inner.settings.clone();
        let handle = tokio::spawn(async move {
            info!("playback loop started");
            run(
                pipeline,
                renderer,
                settings,
                cancel,
                on_exception,
                on_timestamp,
                on_end_of_media,
            )
            .await;
            inner.is_playing.store(false, Ordering::Release);
            debug!("playback loop exited");
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
    renderer: RendererSlot,
    settings: watch::Receiver<Settings>,
    cancel: CancellationToken,
    on_exception: ExceptionHandler,
    on_timestamp: TimestampHandler,
    on_end_of_media: EndOfMediaHandler,
) {
    match &*pipeline {
        Pipeline::Audio(p) => {
            let finished = run_audio_track(
                &p.sampler,
                &p.buffer,
                &settings,
                &cancel,
                &on_exception,
                &on_timestamp,
            )
            .await;
            if finished {
                on_end_of_media();
            }
        }
        Pipeline::Video(p) => {
            let finished = run_video_track_unsynced(
                &p.buffer,
                &p.pool,
                &renderer,
                &settings,
                &cancel,
                &on_exception,
                &on_timestamp,
            )
            .await;
            if finished {
                on_end_of_media();
            }
        }
        Pipeline::AudioVideo(p) => {
            let audio_clock_nanos = Arc::new(AtomicU64::new(0));
            let audio_fut = run_audio_track_reporting_clock(
                &p.sampler,
                &p.audio_buffer,
                &settings,
                &cancel,
                &on_exception,
                &on_timestamp,
                &audio_clock_nanos,
            );
            let video_fut = run_video_track_synced(
                &p.video_buffer,
                &p.video_pool,
                &renderer,
                &settings,
                &cancel,
                &on_exception,
                &audio_clock_nanos,
            );
            let (audio_finished, video_finished) = tokio::join!(audio_fut, video_fut);
            if audio_finished && video_finished {
                on_end_of_media();
            }
        }
    }
}

async fn run_audio_track(
    sampler: &AsyncMutex<Box<dyn mediacore_types::Sampler>>,
    buffer: &mediacore_buffer::BoundedFrameBuffer<Frame>,
    settings: &watch::Receiver<Settings>,
    cancel: &CancellationToken,
    on_exception: &ExceptionHandler,
    on_timestamp: &TimestampHandler,
) -> bool {
    loop {
        if cancel.is_cancelled() {
            return false;
        }
        let frame = tokio::select! {
            _ = cancel.cancelled() => return false,
            frame = buffer.take() => match frame {
                Ok(frame) => frame,
                Err(_) => return false,
            },
        };
        match frame {
            Frame::EndOfStream => return true,
            Frame::Audio { timestamp, bytes } => {
                let current = settings.borrow().clone();
                let write_result = sampler
                    .lock()
                    .await
                    .write(&bytes, current.effective_gain(), current.playback_speed_factor)
                    .await;
                if let Err(err) = write_result {
                    on_exception(MediaError::PlaybackLoopException(Box::new(err)));
                    return false;
                }
                on_timestamp(timestamp);
            }
            Frame::Video { .. } => unreachable!("audio buffer never carries video frames"),
        }
    }
}

async fn run_audio_track_reporting_clock(
    sampler: &AsyncMutex<Box<dyn mediacore_types::Sampler>>,
    buffer: &mediacore_buffer::BoundedFrameBuffer<Frame>,
    settings: &watch::Receiver<Settings>,
    cancel: &CancellationToken,
    on_exception: &ExceptionHandler,
    on_timestamp: &TimestampHandler,
    audio_clock_nanos: &AtomicU64,
) -> bool {
    loop {
        if cancel.is_cancelled() {
            return false;
        }
        let frame = tokio::select! {
            _ = cancel.cancelled() => return false,
            frame = buffer.take() => match frame {
                Ok(frame) => frame,
                Err(_) => return false,
            },
        };
        match frame {
            Frame::EndOfStream => return true,
            Frame::Audio { timestamp, bytes } => {
                let current = settings.borrow().clone();
                let write_result = sampler
                    .lock()
                    .await
                    .write(&bytes, current.effective_gain(), current.playback_speed_factor)
                    .await;
                if let Err(err) = write_result {
                    on_exception(MediaError::PlaybackLoopException(Box::new(err)));
                    return false;
                }
                audio_clock_nanos.store(timestamp.as_nanos().min(u64::MAX as u128) as u64, Ordering::Release);
                on_timestamp(timestamp);
            }
            Frame::Video { .. } => unreachable!("audio buffer never carries video frames"),
        }
    }
}

async fn present_or_drop(
    renderer: &RendererSlot,
    pool: &mediacore_buffer::Pool,
    timestamp: Duration,
    data: RawVideoData,
) -> Result<(), MediaError> {
    let mut guard = renderer.lock().await;
    match guard.as_mut() {
        Some(renderer) => match renderer.present(timestamp, data).await {
            Ok(returned) => {
                pool.release(returned);
                Ok(())
            }
            Err(err) => Err(err),
        },
        None => {
            pool.release(data);
            Ok(())
        }
    }
}

async fn run_video_track_unsynced(
    buffer: &mediacore_buffer::BoundedFrameBuffer<Frame>,
    pool: &mediacore_buffer::Pool,
    renderer: &RendererSlot,
    settings: &watch::Receiver<Settings>,
    cancel: &CancellationToken,
    on_exception: &ExceptionHandler,
    on_timestamp: &TimestampHandler,
) -> bool {
    let mut last_timestamp: Option<Duration> = None;
    loop {
        if cancel.is_cancelled() {
            return false;
        }
        let frame = tokio::select! {
            _ = cancel.cancelled() => return false,
            frame = buffer.take() => match frame {
                Ok(frame) => frame,
                Err(_) => return false,
            },
        };
        match frame {
            Frame::EndOfStream => return true,
            Frame::Video { timestamp, data } => {
                let speed = settings.borrow().playback_speed_factor;
                if let Some(previous) = last_timestamp {
                    if timestamp > previous {
                        let pacing = (timestamp - previous).div_f64(speed.max(f32::EPSILON) as f64);
                        tokio::select! {
                            _ = cancel.cancelled() => return false,
                            _ = tokio::time::sleep(pacing) => {}
                        }
                    }
                }
                last_timestamp = Some(timestamp);
                if let Err(err) = present_or_drop(renderer, pool, timestamp, data).await {
                    on_exception(MediaError::PlaybackLoopException(Box::new(err)));
                    return false;
                }
                on_timestamp(timestamp);
            }
            Frame::Audio { .. } => unreachable!("video buffer never carries audio frames"),
        }
    }
}

async fn run_video_track_synced(
    buffer: &mediacore_buffer::BoundedFrameBuffer<Frame>,
    pool: &mediacore_buffer::Pool,
    renderer: &RendererSlot,
    settings: &watch::Receiver<Settings>,
    cancel: &CancellationToken,
    on_exception: &ExceptionHandler,
    audio_clock_nanos: &AtomicU64,
) -> bool {
    loop {
        if cancel.is_cancelled() {
            return false;
        }
        let frame = tokio::select! {
            _ = cancel.cancelled() => return false,
            frame = buffer.take() => match frame {
                Ok(frame) => frame,
                Err(_) => return false,
            },
        };
        match frame {
            Frame::EndOfStream => return true,
            Frame::Video { timestamp, data } => {
                let audio_timestamp = Duration::from_nanos(audio_clock_nanos.load(Ordering::Acquire));
                match sync_decision(timestamp, audio_timestamp) {
                    SyncDecision::Drop => {
                        pool.release(data);
                    }
                    SyncDecision::Display => {
                        if let Err(err) = present_or_drop(renderer, pool, timestamp, data).await {
                            on_exception(MediaError::PlaybackLoopException(Box::new(err)));
                            return false;
                        }
                    }
                    SyncDecision::Wait { duration } => {
                        let speed = settings.borrow().playback_speed_factor;
                        let pacing = duration.div_f64(speed.max(f32::EPSILON) as f64);
                        tokio::select! {
                            _ = cancel.cancelled() => return false,
                            _ = tokio::time::sleep(pacing) => {}
                        }
                        if let Err(err) = present_or_drop(renderer, pool, timestamp, data).await {
                            on_exception(MediaError::PlaybackLoopException(Box::new(err)));
                            return false;
                        }
                    }
                }
            }
            Frame::Audio { .. } => unreachable!("video buffer never carries audio frames"),
        }
    }
}
