//! Controller tuning parameters

use mediacore_types::Settings;

/// Tunable parameters for a [`crate::PlayerController`] that live for the
/// controller's whole lifetime, independent of any single `Prepare` call
/// (per-call buffer sizing is part of [`crate::Command::Prepare`] itself).
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Capacity of the video frame-data pool. Rebuilt fresh on every
    /// successful `Prepare`.
    pub video_pool_capacity: usize,
    /// Settings a freshly prepared session starts with, and what
    /// `resetSettings` reinstates.
    pub default_settings: Settings,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            video_pool_capacity: 8,
            default_settings: Settings::default(),
        }
    }
}
