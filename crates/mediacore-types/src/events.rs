//! Events published on the player's broadcast event bus

use crate::errors::MediaError;

/// Events published by the player controller.
///
/// Subscribers attach to a `tokio::sync::broadcast` channel; a late
/// subscriber only observes events emitted after it subscribed (the
/// observable *state*/*settings*/*timestamp* values, by contrast, are
/// watch channels and always show the latest value).
#[derive(Debug, Clone)]
pub enum PlayerEvent {
    /// A loop surfaced an exception; the controller auto-releases to `Empty`
    /// immediately after publishing this event.
    Error(MediaError),
    /// The buffer loop ran to completion (both streams reached
    /// end-of-stream for A/V media). Fires once per buffer-loop run.
    BufferComplete,
    /// The playback loop ran to completion; the controller transitions to
    /// `COMPLETED` immediately after publishing this event.
    EndOfMedia,
    /// A renderer was successfully attached.
    RendererAttached,
    /// A renderer was detached (either explicitly or as part of teardown).
    RendererDetached,
}
