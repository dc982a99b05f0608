//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::CueError;
use crate::space::PosePolicy;

/// Configuration for a cue engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ticks of neutral (1x) rate after the engine becomes the governing instance.
    pub warmup_ticks: u32,
    /// Initial play-mode rate.
    pub default_play_rate: f32,
    /// Initial edit-mode rate.
    pub default_edit_rate: f32,
    /// Upper clamp for both rates.
    pub max_rate: f32,
    /// How poses pass through anchor matrices.
    pub pose_policy: PosePolicy,
    /// Re-read stored poses from live instances every tick.
    pub sync_pose_from_instances: bool,
    /// File extension used by `FileStore` snapshots.
    pub snapshot_extension: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            warmup_ticks: 1,
            default_play_rate: 1.0,
            default_edit_rate: 0.0,
            max_rate: 1.0,
            pose_policy: PosePolicy::LegacyVectorTransform,
            sync_pose_from_instances: false,
            snapshot_extension: "dat".to_string(),
        }
    }
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), CueError> {
        if self.max_rate <= 0.0 || !self.max_rate.is_finite() {
            return Err(CueError::InvalidConfig {
                reason: "max_rate must be positive and finite".to_string(),
            });
        }
        for (name, rate) in [
            ("default_play_rate", self.default_play_rate),
            ("default_edit_rate", self.default_edit_rate),
        ] {
            if !(0.0..=self.max_rate).contains(&rate) {
                return Err(CueError::InvalidConfig {
                    reason: format!("{name} must lie in [0, max_rate]"),
                });
            }
        }
        if self.snapshot_extension.is_empty()
            || self.snapshot_extension.contains(['/', '\\', '.'])
        {
            return Err(CueError::InvalidConfig {
                reason: "snapshot_extension must be a bare, non-empty extension".to_string(),
            });
        }
        Ok(())
    }

    /// Clamp a rate into the configured range.
    #[inline]
    pub fn clamp_rate(&self, rate: f32) -> f32 {
        if rate.is_nan() {
            return 0.0;
        }
        rate.clamp(0.0, self.max_rate)
    }

    #[inline]
    pub fn with_warmup_ticks(mut self, ticks: u32) -> Self {
        self.warmup_ticks = ticks;
        self
    }

    #[inline]
    pub fn with_rates(mut self, play: f32, edit: f32) -> Self {
        self.default_play_rate = play;
        self.default_edit_rate = edit;
        self
    }

    #[inline]
    pub fn with_max_rate(mut self, max: f32) -> Self {
        self.max_rate = max;
        self
    }

    #[inline]
    pub fn with_pose_policy(mut self, policy: PosePolicy) -> Self {
        self.pose_policy = policy;
        self
    }

    #[inline]
    pub fn with_pose_sync(mut self, enabled: bool) -> Self {
        self.sync_pose_from_instances = enabled;
        self
    }

    #[inline]
    pub fn with_snapshot_extension(mut self, ext: impl Into<String>) -> Self {
        self.snapshot_extension = ext.into();
        self
    }
}
