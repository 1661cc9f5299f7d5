//! The player controller: state machine, command serialization, and the
//! lifecycle of a pipeline plus its two loops
//!
//! One command mutex serializes every state-mutating entry point, matching
//! the single-writer discipline `media_engine::engine` uses around its
//! session map, generalized here to a single session rather than a
//! `HashMap` of them (this crate models exactly one loaded media at a time).

use crate::command::Command;
use crate::config::ControllerConfig;
use mediacore_buffer::BufferConfig;
use mediacore_pipeline::{
    BufferLoop, EndOfMediaHandler, ExceptionHandler, Pipeline, PlaybackLoop, RendererSlot,
    TimestampHandler,
};
use mediacore_types::{
    MediaError, MediaProber, MediaResult, Media, PipelineFactory, PlaybackStatus, PlayerEvent,
    PlayerState, Renderer, Settings,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch, Mutex as AsyncMutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

struct Session {
    media: Media,
    pipeline: Arc<Pipeline>,
    buffer_loop: BufferLoop,
    playback_loop: PlaybackLoop,
    status: PlaybackStatus,
}

struct Inner {
    prober: Arc<dyn MediaProber>,
    factory: Arc<dyn PipelineFactory>,
    config: ControllerConfig,

    command_lock: AsyncMutex<()>,
    session: parking_lot::Mutex<Option<Session>>,
    renderer: RendererSlot,
    /// Set for the duration of a `Prepare`'s probe phase, the one
    /// long-running step that holds no resources yet and so can be
    /// interrupted without a leak. `Release` cancels it to avoid waiting
    /// behind a slow probe (§4.6's `currentCommandJob` cancel-and-join,
    /// scoped to the phase where cancellation is actually safe).
    preparing_cancel: parking_lot::Mutex<Option<CancellationToken>>,

    state_tx: watch::Sender<PlayerState>,
    settings_tx: watch::Sender<Settings>,
    buffer_timestamp_tx: watch::Sender<Duration>,
    playback_timestamp_tx: watch::Sender<Duration>,
    last_error_tx: watch::Sender<Option<MediaError>>,
    events_tx: broadcast::Sender<PlayerEvent>,
}

/// Drives exactly one loaded media through the `Empty` → `Preparing` →
/// `Ready` lifecycle, serializing every command behind an internal lock and
/// publishing state, settings, timestamps, and events to subscribers.
#[derive(Clone)]
pub struct PlayerController {
    inner: Arc<Inner>,
}

impl PlayerController {
    /// Creates a controller with no media loaded, observing `prober` and
    /// `factory` as the collaborators `Prepare` drives.
    pub fn new(prober: Arc<dyn MediaProber>, factory: Arc<dyn PipelineFactory>, config: ControllerConfig) -> Self {
        let (state_tx, _) = watch::channel(PlayerState::Empty);
        let (settings_tx, _) = watch::channel(config.default_settings);
        let (buffer_timestamp_tx, _) = watch::channel(Duration::ZERO);
        let (playback_timestamp_tx, _) = watch::channel(Duration::ZERO);
        let (last_error_tx, _) = watch::channel(None);
        let (events_tx, _) = broadcast::channel(64);

        Self {
            inner: Arc::new(Inner {
                prober,
                factory,
                config,
                command_lock: AsyncMutex::new(()),
                session: parking_lot::Mutex::new(None),
                renderer: Arc::new(AsyncMutex::new(None)),
                preparing_cancel: parking_lot::Mutex::new(None),
                state_tx,
                settings_tx,
                buffer_timestamp_tx,
                playback_timestamp_tx,
                last_error_tx,
                events_tx,
            }),
        }
    }

    /// Subscribes to the controller's observable state.
    pub fn state(&self) -> watch::Receiver<PlayerState> {
        self.inner.state_tx.subscribe()
    }

    /// Subscribes to the controller's observable settings.
    pub fn settings(&self) -> watch::Receiver<Settings> {
        self.inner.settings_tx.subscribe()
    }

    /// Subscribes to the most recent buffer timestamp.
    pub fn buffer_timestamp(&self) -> watch::Receiver<Duration> {
        self.inner.buffer_timestamp_tx.subscribe()
    }

    /// Subscribes to the most recent playback timestamp.
    pub fn playback_timestamp(&self) -> watch::Receiver<Duration> {
        self.inner.playback_timestamp_tx.subscribe()
    }

    /// Subscribes to the cause of the most recent `Error` event, retained
    /// until the next successful `Prepare`.
    pub fn last_error(&self) -> watch::Receiver<Option<MediaError>> {
        self.inner.last_error_tx.subscribe()
    }

    /// Subscribes to the event bus. Only events published after
    /// subscribing are observed.
    pub fn events(&self) -> broadcast::Receiver<PlayerEvent> {
        self.inner.events_tx.subscribe()
    }

    /// Executes `command`, serialized against every other command.
    ///
    /// `Release` additionally cancels a `Prepare` that is currently blocked
    /// probing, rather than waiting for it in line: the probe is the one
    /// phase of `Prepare` that holds no resources, so it can be interrupted
    /// immediately and safely.
    pub async fn execute(&self, command: Command) -> MediaResult<()> {
        if matches!(command, Command::Release) {
            if let Some(cancel) = self.inner.preparing_cancel.lock().clone() {
                cancel.cancel();
            }
        }
        let _guard = self.inner.command_lock.lock().await;
        match command {
            Command::Prepare {
                location,
                audio_buffer_size,
                video_buffer_size,
                hardware_acceleration_candidates,
            } => {
                self.do_prepare(
                    location,
                    audio_buffer_size,
                    video_buffer_size,
                    hardware_acceleration_candidates,
                )
                .await
            }
            Command::Play => self.do_play().await,
            Command::Pause => self.do_pause().await,
            Command::Resume => self.do_resume().await,
            Command::Stop => self.do_stop().await,
            Command::SeekTo {
                timestamp,
                keyframes_only,
            } => self.do_seek(timestamp, keyframes_only).await,
            Command::Release => {
                self.release_locked().await;
                Ok(())
            }
        }
    }

    /// Attaches `renderer`. Fails if one is already attached.
    pub async fn attach_renderer(&self, renderer: Box<dyn Renderer>) -> MediaResult<()> {
        let mut guard = self.inner.renderer.lock().await;
        if guard.is_some() {
            return Err(MediaError::RendererAlreadyAttached);
        }
        *guard = Some(renderer);
        drop(guard);
        let _ = self.inner.events_tx.send(PlayerEvent::RendererAttached);
        Ok(())
    }

    /// Detaches and returns the current renderer, if any.
    pub async fn detach_renderer(&self) -> Option<Box<dyn Renderer>> {
        let mut guard = self.inner.renderer.lock().await;
        let previous = guard.take();
        drop(guard);
        if previous.is_some() {
            let _ = self.inner.events_tx.send(PlayerEvent::RendererDetached);
        }
        previous
    }

    /// Validates and replaces the observable settings. Takes effect on
    /// subsequent frames without resynchronization.
    pub fn change_settings(&self, settings: Settings) -> MediaResult<()> {
        settings.validate()?;
        let _ = self.inner.settings_tx.send(settings);
        Ok(())
    }

    /// Reinstates the controller's configured default settings.
    pub fn reset_settings(&self) {
        let _ = self.inner.settings_tx.send(self.inner.config.default_settings);
    }

    /// Releases the current session, if any. Equivalent to
    /// `execute(Command::Release)`.
    pub async fn close(&self) -> MediaResult<()> {
        self.execute(Command::Release).await
    }

    async fn do_prepare(
        &self,
        location: String,
        audio_buffer_size: usize,
        video_buffer_size: usize,
        hardware_acceleration_candidates: Vec<String>,
    ) -> MediaResult<()> {
        if self.inner.session.lock().is_some() {
            return Ok(());
        }

        info!(location = %location, "preparing media");
        let _ = self.inner.state_tx.send(PlayerState::Preparing);

        let cancel = CancellationToken::new();
        *self.inner.preparing_cancel.lock() = Some(cancel.clone());

        let probed = tokio::select! {
            _ = cancel.cancelled() => None,
            result = self.inner.prober.probe(&location, true, true) => Some(result),
        };
        let media = match probed {
            None => {
                debug!("prepare cancelled by release during probe");
                self.inner.preparing_cancel.lock().take();
                let _ = self.inner.state_tx.send(PlayerState::Empty);
                return Ok(());
            }
            Some(Ok(media)) => media,
            Some(Err(err)) => {
                warn!(error = %err, "probe failed during prepare");
                self.inner.preparing_cancel.lock().take();
                let _ = self.inner.state_tx.send(PlayerState::Empty);
                return Err(err);
            }
        };

        let buffer_config = BufferConfig {
            audio_buffer_size,
            video_buffer_size,
            video_pool_capacity: self.inner.config.video_pool_capacity,
        };

        // Construction itself is not raced against `cancel`: decoders are
        // acquired one at a time and dropping this future mid-construction
        // would bypass their async `close()`, leaking whatever was already
        // opened. Instead it always runs to completion and is torn down
        // immediately afterward if a cancellation arrived meanwhile.
        let pipeline = match self
            .construct_pipeline(&media, &location, &buffer_config, &hardware_acceleration_candidates)
            .await
        {
            Ok(pipeline) => pipeline,
            Err(err) => {
                warn!(error = %err, "pipeline construction failed during prepare");
                self.inner.preparing_cancel.lock().take();
                let _ = self.inner.state_tx.send(PlayerState::Empty);
                return Err(err);
            }
        };

        if cancel.is_cancelled() {
            debug!("prepare cancelled by release after construction, tearing down");
            self.inner.preparing_cancel.lock().take();
            if let Err(err) = pipeline.close().await {
                warn!(error = %err, "pipeline close failed while unwinding a cancelled prepare");
            }
            let _ = self.inner.state_tx.send(PlayerState::Empty);
            return Ok(());
        }
        self.inner.preparing_cancel.lock().take();

        let pipeline = Arc::new(pipeline);
        let buffer_loop = BufferLoop::new(pipeline.clone());
        let playback_loop = PlaybackLoop::new(
            pipeline.clone(),
            self.inner.renderer.clone(),
            self.inner.settings_tx.subscribe(),
        );

        *self.inner.session.lock() = Some(Session {
            media: media.clone(),
            pipeline,
            buffer_loop,
            playback_loop,
            status: PlaybackStatus::Stopped,
        });
        let _ = self.inner.last_error_tx.send(None);
        self.publish_state(media, PlaybackStatus::Stopped);
        debug!("prepare complete");
        Ok(())
    }

    async fn construct_pipeline(
        &self,
        media: &Media,
        location: &str,
        buffer_config: &BufferConfig,
        hardware_acceleration_candidates: &[String],
    ) -> MediaResult<Pipeline> {
        match media {
            Media::Audio { .. } => {
                let mut audio_decoder = self.inner.factory.create_audio_decoder(location).await?;
                let sampler = match self.inner.factory.create_sampler().await {
                    Ok(sampler) => sampler,
                    Err(err) => {
                        let _ = audio_decoder.close().await;
                        return Err(err);
                    }
                };
                Ok(Pipeline::new_audio(audio_decoder, sampler, buffer_config))
            }
            Media::Video { video_format, .. } => {
                let video_decoder = self
                    .inner
                    .factory
                    .create_video_decoder(location, hardware_acceleration_candidates)
                    .await?;
                Ok(Pipeline::new_video(video_decoder, video_format.buffer_capacity, buffer_config))
            }
            Media::AudioVideo { video_format, .. } => {
                let mut audio_decoder = self.inner.factory.create_audio_decoder(location).await?;
                let mut video_decoder = match self
                    .inner
                    .factory
                    .create_video_decoder(location, hardware_acceleration_candidates)
                    .await
                {
                    Ok(decoder) => decoder,
                    Err(err) => {
                        let _ = audio_decoder.close().await;
                        return Err(err);
                    }
                };
                let sampler = match self.inner.factory.create_sampler().await {
                    Ok(sampler) => sampler,
                    Err(err) => {
                        let _ = video_decoder.close().await;
                        let _ = audio_decoder.close().await;
                        return Err(err);
                    }
                };
                Ok(Pipeline::new_audio_video(
                    audio_decoder,
                    video_decoder,
                    sampler,
                    video_format.buffer_capacity,
                    buffer_config,
                ))
            }
        }
    }

    async fn do_play(&self) -> MediaResult<()> {
        let snapshot = {
            let mut guard = self.inner.session.lock();
            let Some(session) = guard.as_mut() else {
                return Ok(());
            };
            if session.status != PlaybackStatus::Stopped {
                return Ok(());
            }
            if !session.media.is_continuous() {
                return Ok(());
            }
            session.status = PlaybackStatus::Transition;
            (
                session.pipeline.clone(),
                session.buffer_loop.clone(),
                session.playback_loop.clone(),
                session.media.clone(),
            )
        };
        let (pipeline, buffer_loop, playback_loop, media) = snapshot;
        self.publish_state(media.clone(), PlaybackStatus::Transition);

        pipeline.start_sampler().await?;
        let (on_exception, on_timestamp, on_end_of_media) = self.playback_loop_handlers();
        playback_loop.start(on_exception, on_timestamp, on_end_of_media)?;
        let (on_exception, on_timestamp, on_end_of_media) = self.buffer_loop_handlers();
        buffer_loop.start(on_exception, on_timestamp, on_end_of_media)?;

        self.set_status(PlaybackStatus::Playing);
        self.publish_state(media, PlaybackStatus::Playing);
        info!("playback started");
        Ok(())
    }

    async fn do_pause(&self) -> MediaResult<()> {
        let snapshot = {
            let mut guard = self.inner.session.lock();
            let Some(session) = guard.as_mut() else {
                return Ok(());
            };
            if session.status != PlaybackStatus::Playing {
                return Ok(());
            }
            session.status = PlaybackStatus::Transition;
            (session.pipeline.clone(), session.playback_loop.clone(), session.media.clone())
        };
        let (pipeline, playback_loop, media) = snapshot;
        self.publish_state(media.clone(), PlaybackStatus::Transition);

        playback_loop.stop().await;
        if let Err(err) = pipeline.stop_sampler().await {
            warn!(error = %err, "sampler stop failed during pause");
        }

        self.set_status(PlaybackStatus::Paused);
        self.publish_state(media, PlaybackStatus::Paused);
        Ok(())
    }

    async fn do_resume(&self) -> MediaResult<()> {
        let snapshot = {
            let mut guard = self.inner.session.lock();
            let Some(session) = guard.as_mut() else {
                return Ok(());
            };
            if session.status != PlaybackStatus::Paused {
                return Ok(());
            }
            session.status = PlaybackStatus::Transition;
            (session.pipeline.clone(), session.playback_loop.clone(), session.media.clone())
        };
        let (pipeline, playback_loop, media) = snapshot;
        self.publish_state(media.clone(), PlaybackStatus::Transition);

        pipeline.start_sampler().await?;
        let (on_exception, on_timestamp, on_end_of_media) = self.playback_loop_handlers();
        playback_loop.start(on_exception, on_timestamp, on_end_of_media)?;

        self.set_status(PlaybackStatus::Playing);
        self.publish_state(media, PlaybackStatus::Playing);
        Ok(())
    }

    async fn do_stop(&self) -> MediaResult<()> {
        let snapshot = {
            let mut guard = self.inner.session.lock();
            let Some(session) = guard.as_mut() else {
                return Ok(());
            };
            if !matches!(
                session.status,
                PlaybackStatus::Playing
                    | PlaybackStatus::Paused
                    | PlaybackStatus::Completed
                    | PlaybackStatus::Seeking
            ) {
                return Ok(());
            }
            session.status = PlaybackStatus::Transition;
            (
                session.pipeline.clone(),
                session.buffer_loop.clone(),
                session.playback_loop.clone(),
                session.media.clone(),
            )
        };
        let (pipeline, buffer_loop, playback_loop, media) = snapshot;
        self.publish_state(media.clone(), PlaybackStatus::Transition);

        playback_loop.stop().await;
        buffer_loop.stop().await;
        if let Err(err) = pipeline.flush_sampler().await {
            warn!(error = %err, "sampler flush failed during stop");
        }
        if let Err(err) = pipeline.clear_and_reset().await {
            warn!(error = %err, "pipeline reset failed during stop");
        }

        let _ = self.inner.buffer_timestamp_tx.send(Duration::ZERO);
        let _ = self.inner.playback_timestamp_tx.send(Duration::ZERO);
        self.set_status(PlaybackStatus::Stopped);
        self.publish_state(media, PlaybackStatus::Stopped);
        Ok(())
    }

    async fn do_seek(&self, timestamp: Duration, keyframes_only: bool) -> MediaResult<()> {
        let snapshot = {
            let mut guard = self.inner.session.lock();
            let Some(session) = guard.as_mut() else {
                return Ok(());
            };
            if !matches!(
                session.status,
                PlaybackStatus::Playing
                    | PlaybackStatus::Paused
                    | PlaybackStatus::Stopped
                    | PlaybackStatus::Completed
                    | PlaybackStatus::Seeking
            ) {
                return Ok(());
            }
            if !session.media.is_continuous() {
                return Ok(());
            }
            session.status = PlaybackStatus::Seeking;
            (
                session.pipeline.clone(),
                session.buffer_loop.clone(),
                session.playback_loop.clone(),
                session.media.clone(),
            )
        };
        let (pipeline, buffer_loop, playback_loop, media) = snapshot;
        self.publish_state(media.clone(), PlaybackStatus::Seeking);

        playback_loop.stop().await;
        buffer_loop.stop().await;
        if let Err(err) = pipeline.flush_sampler().await {
            warn!(error = %err, "sampler flush failed during seek");
        }
        if let Err(err) = pipeline.clear_and_reset().await {
            warn!(error = %err, "pipeline reset failed during seek");
        }

        let actual = match seek_decoders(&pipeline, timestamp, keyframes_only).await {
            Ok(actual) => actual,
            Err(err) => {
                error!(error = %err, "decoder seek failed");
                return Err(err);
            }
        };

        let (on_exception, on_timestamp, on_end_of_media) = self.buffer_loop_handlers();
        buffer_loop.start(on_exception, on_timestamp, on_end_of_media)?;

        let _ = self.inner.buffer_timestamp_tx.send(actual);
        let _ = self.inner.playback_timestamp_tx.send(actual);
        self.set_status(PlaybackStatus::Paused);
        self.publish_state(media, PlaybackStatus::Paused);
        info!(actual_ms = actual.as_millis(), "seek complete");
        Ok(())
    }

    async fn release_locked(&self) {
        let snapshot = {
            let mut guard = self.inner.session.lock();
            match guard.as_mut() {
                None => return,
                Some(session) => {
                    session.status = PlaybackStatus::Releasing;
                    (
                        session.pipeline.clone(),
                        session.buffer_loop.clone(),
                        session.playback_loop.clone(),
                        session.media.clone(),
                    )
                }
            }
        };
        let (pipeline, buffer_loop, playback_loop, media) = snapshot;
        self.publish_state(media, PlaybackStatus::Releasing);

        playback_loop.close();
        buffer_loop.close();
        if let Err(err) = pipeline.close().await {
            warn!(error = %err, "pipeline close reported an error during release");
        }

        *self.inner.session.lock() = None;
        let _ = self.inner.buffer_timestamp_tx.send(Duration::ZERO);
        let _ = self.inner.playback_timestamp_tx.send(Duration::ZERO);
        let _ = self.inner.state_tx.send(PlayerState::Empty);
        info!("session released");
    }

    async fn handle_runtime_error(&self, err: MediaError) {
        error!(error = %err, "runtime loop failure, releasing session");
        let _ = self.inner.events_tx.send(PlayerEvent::Error(err.clone()));
        let _ = self.inner.last_error_tx.send(Some(err));
        let _guard = self.inner.command_lock.lock().await;
        self.release_locked().await;
    }

    fn set_status(&self, status: PlaybackStatus) {
        if let Some(session) = self.inner.session.lock().as_mut() {
            session.status = status;
        }
    }

    fn publish_state(&self, media: Media, status: PlaybackStatus) {
        let _ = self.inner.state_tx.send(PlayerState::Ready { media, status });
    }

    fn report_buffer_timestamp(&self, timestamp: Duration) {
        let status = self.inner.session.lock().as_ref().map(|session| session.status);
        if matches!(status, Some(PlaybackStatus::Playing) | Some(PlaybackStatus::Paused)) {
            let _ = self.inner.buffer_timestamp_tx.send(timestamp);
        }
    }

    fn report_playback_timestamp(&self, timestamp: Duration) {
        let status = self.inner.session.lock().as_ref().map(|session| session.status);
        if matches!(status, Some(PlaybackStatus::Playing)) {
            let _ = self.inner.playback_timestamp_tx.send(timestamp);
        }
    }

    fn buffer_loop_handlers(&self) -> (ExceptionHandler, TimestampHandler, EndOfMediaHandler) {
        let controller = self.clone();
        let on_exception: ExceptionHandler = Arc::new(move |err| {
            let controller = controller.clone();
            tokio::spawn(async move {
                controller.handle_runtime_error(err).await;
            });
        });

        let controller = self.clone();
        let on_timestamp: TimestampHandler = Arc::new(move |timestamp| {
            controller.report_buffer_timestamp(timestamp);
        });

        let controller = self.clone();
        let on_end_of_media: EndOfMediaHandler = Arc::new(move || {
            let _ = controller.inner.events_tx.send(PlayerEvent::BufferComplete);
        });

        (on_exception, on_timestamp, on_end_of_media)
    }

    fn playback_loop_handlers(&self) -> (ExceptionHandler, TimestampHandler, EndOfMediaHandler) {
        let controller = self.clone();
        let on_exception: ExceptionHandler = Arc::new(move |err| {
            let controller = controller.clone();
            tokio::spawn(async move {
                controller.handle_runtime_error(err).await;
            });
        });

        let controller = self.clone();
        let on_timestamp: TimestampHandler = Arc::new(move |timestamp| {
            controller.report_playback_timestamp(timestamp);
        });

        let controller = self.clone();
        let on_end_of_media: EndOfMediaHandler = Arc::new(move || {
            let media = {
                let mut guard = controller.inner.session.lock();
                guard.as_mut().map(|session| {
                    session.status = PlaybackStatus::Completed;
                    session.media.clone()
                })
            };
            if let Some(media) = media {
                controller.publish_state(media, PlaybackStatus::Completed);
            }
            let _ = controller.inner.events_tx.send(PlayerEvent::EndOfMedia);
        });

        (on_exception, on_timestamp, on_end_of_media)
    }
}

async fn seek_decoders(pipeline: &Pipeline, timestamp: Duration, keyframes_only: bool) -> MediaResult<Duration> {
    match pipeline {
        Pipeline::Audio(p) => p.decoder.lock().await.seek_to(timestamp, keyframes_only).await,
        Pipeline::Video(p) => p.decoder.lock().await.seek_to(timestamp, keyframes_only).await,
        Pipeline::AudioVideo(p) => {
            let audio_fut = async { p.audio_decoder.lock().await.seek_to(timestamp, keyframes_only).await };
            let video_fut = async { p.video_decoder.lock().await.seek_to(timestamp, keyframes_only).await };
            let (audio_actual, video_actual) = tokio::join!(audio_fut, video_fut);
            Ok(audio_actual?.max(video_actual?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockPipelineFactory, MockProber, SlowProber};
    use std::time::Duration as StdDuration;
    use tokio::time::timeout;

    fn controller(prober: impl MediaProber + 'static, frame_count: usize) -> PlayerController {
        PlayerController::new(
            Arc::new(prober),
            Arc::new(MockPipelineFactory::with_frame_count(frame_count)),
            ControllerConfig::default(),
        )
    }

    async fn wait_for_status(controller: &PlayerController, target: PlaybackStatus) {
        let mut rx = controller.state();
        loop {
            if let PlayerState::Ready { status, .. } = &*rx.borrow() {
                if *status == target {
                    return;
                }
            }
            rx.changed().await.unwrap();
        }
    }

    #[tokio::test]
    async fn prepare_then_play_runs_audio_to_completion() {
        let controller = controller(MockProber::audio(StdDuration::from_secs(1)), 5);
        controller
            .execute(Command::Prepare {
                location: "memory://clip".to_string(),
                audio_buffer_size: 4,
                video_buffer_size: 4,
                hardware_acceleration_candidates: Vec::new(),
            })
            .await
            .unwrap();
        assert!(matches!(*controller.state().borrow(), PlayerState::Ready { status: PlaybackStatus::Stopped, .. }));

        controller.execute(Command::Play).await.unwrap();
        timeout(StdDuration::from_secs(2), wait_for_status(&controller, PlaybackStatus::Completed))
            .await
            .expect("playback should reach Completed");
    }

    #[tokio::test]
    async fn prepare_fails_synchronously_and_reverts_to_empty() {
        let controller = PlayerController::new(
            Arc::new(MockProber::failing()),
            Arc::new(MockPipelineFactory::with_frame_count(1)),
            ControllerConfig::default(),
        );
        let err = controller
            .execute(Command::Prepare {
                location: "memory://broken".to_string(),
                audio_buffer_size: 4,
                video_buffer_size: 4,
                hardware_acceleration_candidates: Vec::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::ProbeFailed { .. }));
        assert!(matches!(*controller.state().borrow(), PlayerState::Empty));
    }

    #[tokio::test]
    async fn seek_in_paused_video_lands_on_requested_timestamp() {
        let controller = controller(MockProber::video(StdDuration::from_secs(5)), 20);
        controller
            .execute(Command::Prepare {
                location: "memory://clip".to_string(),
                audio_buffer_size: 4,
                video_buffer_size: 4,
                hardware_acceleration_candidates: Vec::new(),
            })
            .await
            .unwrap();

        controller
            .execute(Command::SeekTo {
                timestamp: StdDuration::from_millis(250),
                keyframes_only: true,
            })
            .await
            .unwrap();

        assert!(matches!(*controller.state().borrow(), PlayerState::Ready { status: PlaybackStatus::Paused, .. }));
        assert_eq!(*controller.buffer_timestamp().borrow(), StdDuration::from_millis(250));
    }

    #[tokio::test]
    async fn release_while_preparing_tears_down_and_returns_to_empty() {
        let controller = controller(MockProber::audio(StdDuration::from_secs(1)), 5);
        controller
            .execute(Command::Prepare {
                location: "memory://clip".to_string(),
                audio_buffer_size: 4,
                video_buffer_size: 4,
                hardware_acceleration_candidates: Vec::new(),
            })
            .await
            .unwrap();

        controller.execute(Command::Release).await.unwrap();
        assert!(matches!(*controller.state().borrow(), PlayerState::Empty));

        // Releasing again, with no session, is a no-op rather than an error.
        controller.execute(Command::Release).await.unwrap();
    }

    #[tokio::test]
    async fn release_cancels_a_prepare_still_blocked_probing() {
        let controller = PlayerController::new(
            Arc::new(SlowProber::audio(StdDuration::from_secs(1), StdDuration::from_millis(200))),
            Arc::new(MockPipelineFactory::with_frame_count(5)),
            ControllerConfig::default(),
        );

        let prepare_controller = controller.clone();
        let prepare_task = tokio::spawn(async move {
            prepare_controller
                .execute(Command::Prepare {
                    location: "memory://slow".to_string(),
                    audio_buffer_size: 4,
                    video_buffer_size: 4,
                    hardware_acceleration_candidates: Vec::new(),
                })
                .await
        });

        // Give the probe a moment to start before releasing.
        tokio::time::sleep(StdDuration::from_millis(20)).await;
        timeout(StdDuration::from_millis(500), controller.execute(Command::Release))
            .await
            .expect("release should not wait out the slow probe")
            .unwrap();

        assert!(matches!(*controller.state().borrow(), PlayerState::Empty));
        prepare_task.await.unwrap().unwrap();
        assert!(matches!(*controller.state().borrow(), PlayerState::Empty));
    }

    #[tokio::test]
    async fn play_is_a_no_op_when_media_is_not_continuous() {
        let controller = controller(MockProber::audio(StdDuration::ZERO), 5);
        controller
            .execute(Command::Prepare {
                location: "memory://still".to_string(),
                audio_buffer_size: 4,
                video_buffer_size: 4,
                hardware_acceleration_candidates: Vec::new(),
            })
            .await
            .unwrap();

        controller.execute(Command::Play).await.unwrap();
        assert!(matches!(*controller.state().borrow(), PlayerState::Ready { status: PlaybackStatus::Stopped, .. }));
    }

    #[tokio::test]
    async fn decoder_error_during_playback_emits_error_once_and_auto_releases() {
        let controller = PlayerController::new(
            Arc::new(MockProber::video(StdDuration::from_secs(5))),
            Arc::new(MockPipelineFactory::with_video_failing_at(0)),
            ControllerConfig::default(),
        );
        controller
            .execute(Command::Prepare {
                location: "memory://clip".to_string(),
                audio_buffer_size: 4,
                video_buffer_size: 4,
                hardware_acceleration_candidates: Vec::new(),
            })
            .await
            .unwrap();

        let mut events = controller.events();
        controller.execute(Command::Play).await.unwrap();

        let event = timeout(StdDuration::from_secs(1), events.recv())
            .await
            .expect("an Error event should be published")
            .unwrap();
        assert!(matches!(event, PlayerEvent::Error(_)));

        timeout(StdDuration::from_secs(1), async {
            loop {
                if matches!(*controller.state().borrow(), PlayerState::Empty) {
                    return;
                }
                tokio::time::sleep(StdDuration::from_millis(5)).await;
            }
        })
        .await
        .expect("controller should auto-release to Empty after a runtime error");

        assert!(controller.last_error().borrow().is_some());
    }

    #[tokio::test]
    async fn concurrent_play_and_pause_serialize_without_panicking() {
        let controller = controller(MockProber::audio(StdDuration::from_secs(5)), 1_000);
        controller
            .execute(Command::Prepare {
                location: "memory://clip".to_string(),
                audio_buffer_size: 64,
                video_buffer_size: 64,
                hardware_acceleration_candidates: Vec::new(),
            })
            .await
            .unwrap();

        let play_controller = controller.clone();
        let pause_controller = controller.clone();
        let (play_result, pause_result) = tokio::join!(
            tokio::spawn(async move { play_controller.execute(Command::Play).await }),
            tokio::spawn(async move { pause_controller.execute(Command::Pause).await }),
        );
        play_result.unwrap().unwrap();
        // Pause racing a concurrent Play may or may not observe Playing by
        // the time it runs; either outcome is a valid no-op-or-apply result.
        pause_result.unwrap().unwrap();
    }
}
