//! Observable playback settings

use crate::errors::MediaError;

/// Lower bound (inclusive) for [`Settings::playback_speed_factor`].
pub const MIN_PLAYBACK_SPEED_FACTOR: f32 = 0.25;

/// Upper bound (inclusive) for [`Settings::playback_speed_factor`].
pub const MAX_PLAYBACK_SPEED_FACTOR: f32 = 4.0;

/// User-facing playback settings.
///
/// `changeSettings` validates [`Settings::playback_speed_factor`] against
/// [`MIN_PLAYBACK_SPEED_FACTOR`]/[`MAX_PLAYBACK_SPEED_FACTOR`] before
/// replacing the observable value atomically; setting changes take effect on
/// subsequent frames without resynchronization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    /// Output volume in `[0, 1]`.
    pub volume: f32,
    /// When `true`, the sampler receives a gain of `0` regardless of `volume`.
    pub is_muted: bool,
    /// Scales the mapping from frame timestamps to wall time.
    pub playback_speed_factor: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            volume: 1.0,
            is_muted: false,
            playback_speed_factor: 1.0,
        }
    }
}

impl Settings {
    /// Validates this settings value, returning an error describing the
    /// first out-of-range field.
    pub fn validate(&self) -> Result<(), MediaError> {
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(MediaError::InvalidSettings {
                details: format!("volume must be within [0, 1], got {}", self.volume),
            });
        }
        if !(MIN_PLAYBACK_SPEED_FACTOR..=MAX_PLAYBACK_SPEED_FACTOR)
            .contains(&self.playback_speed_factor)
        {
            return Err(MediaError::InvalidSettings {
                details: format!(
                    "playback_speed_factor must be within [{MIN_PLAYBACK_SPEED_FACTOR}, {MAX_PLAYBACK_SPEED_FACTOR}], got {}",
                    self.playback_speed_factor
                ),
            });
        }
        Ok(())
    }

    /// The effective sampler gain: `0` when muted, `volume` otherwise.
    pub fn effective_gain(&self) -> f32 {
        if self.is_muted {
            0.0
        } else {
            self.volume
        }
    }
}
