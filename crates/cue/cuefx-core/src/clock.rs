//! Clip catalog and playback clock ports, with in-memory implementations.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::ids::ClipId;

/// Timing facts about one clip.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClipInfo {
    /// Length in seconds.
    pub length: f32,
    /// Frames per second.
    pub frame_rate: f32,
    #[serde(default)]
    pub looping: bool,
}

impl ClipInfo {
    pub fn new(length: f32, frame_rate: f32, looping: bool) -> Self {
        Self {
            length,
            frame_rate,
            looping,
        }
    }

    /// Frames covered by `length * frame_rate` (the span, floored).
    #[inline]
    pub fn span_frames(&self) -> f32 {
        let span = self.length * self.frame_rate;
        if span.is_finite() && span > 0.0 {
            span
        } else {
            0.0
        }
    }

    /// `floor(frame_rate * length)`; zero for degenerate clips.
    #[inline]
    pub fn total_frames(&self) -> u32 {
        self.span_frames().floor() as u32
    }

    /// Highest addressable frame index.
    #[inline]
    pub fn last_frame(&self) -> u32 {
        self.total_frames().saturating_sub(1)
    }

    /// Normalized position that shows `frame`.
    #[inline]
    pub fn position_of(&self, frame: u32) -> f32 {
        let span = f64::from(self.span_frames());
        if span > 0.0 {
            (f64::from(frame) / span) as f32
        } else {
            0.0
        }
    }
}

/// Read-only view of the clips a host can play.
pub trait ClipCatalog {
    fn clip(&self, id: &ClipId) -> Option<ClipInfo>;

    /// Every clip known to the host, in a stable order.
    fn clips(&self) -> Vec<ClipId>;
}

/// The animation playback the engine reads frames from and seeks in authoring mode.
pub trait PlaybackClock {
    /// `false` while the host component is disabled or inactive.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Clip owned by the state currently playing, if any.
    fn current_clip(&self) -> Option<ClipId>;

    /// Normalized time of the current state. May exceed 1 on looping clips.
    fn normalized_position(&self) -> f32;

    /// Seek the current clip to a normalized position.
    fn seek(&mut self, clip: &ClipId, normalized: f32);

    /// Start `clip` from its beginning.
    fn restart(&mut self, clip: &ClipId);
}

/// Clip catalog backed by a map.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ClipLibrary {
    clips: HashMap<ClipId, ClipInfo>,
}

impl ClipLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<ClipId>, info: ClipInfo) -> &mut Self {
        self.clips.insert(id.into(), info);
        self
    }

    pub fn with_clip(mut self, id: impl Into<ClipId>, info: ClipInfo) -> Self {
        self.insert(id, info);
        self
    }

    pub fn remove(&mut self, id: &ClipId) -> Option<ClipInfo> {
        self.clips.remove(id)
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

impl ClipCatalog for ClipLibrary {
    fn clip(&self, id: &ClipId) -> Option<ClipInfo> {
        self.clips.get(id).copied()
    }

    fn clips(&self) -> Vec<ClipId> {
        let mut ids: Vec<ClipId> = self.clips.keys().cloned().collect();
        ids.sort();
        ids
    }
}

/// Hand-driven clock: tests and headless hosts set the clip and position directly.
///
/// Seeks and restarts are recorded so callers can assert on them.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    pub enabled: bool,
    clip: Option<ClipId>,
    position: f32,
    seeks: Vec<(ClipId, f32)>,
    restarts: Vec<ClipId>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    /// Clock already playing `clip` from the start.
    pub fn playing(clip: impl Into<ClipId>) -> Self {
        let mut clock = Self::new();
        clock.play(clip);
        clock
    }

    /// Switch to `clip` at position 0 without recording a restart.
    pub fn play(&mut self, clip: impl Into<ClipId>) {
        self.clip = Some(clip.into());
        self.position = 0.0;
    }

    pub fn stop(&mut self) {
        self.clip = None;
        self.position = 0.0;
    }

    pub fn set_position(&mut self, normalized: f32) {
        self.position = normalized;
    }

    /// Advance the normalized position by `dt` seconds of `info` at `speed`.
    pub fn advance(&mut self, info: &ClipInfo, dt: f32, speed: f32) {
        if info.length > 0.0 {
            self.position += dt * speed / info.length;
        }
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn seeks(&self) -> &[(ClipId, f32)] {
        &self.seeks
    }

    pub fn restarts(&self) -> &[ClipId] {
        &self.restarts
    }

    pub fn clear_history(&mut self) {
        self.seeks.clear();
        self.restarts.clear();
    }
}

impl PlaybackClock for ManualClock {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn current_clip(&self) -> Option<ClipId> {
        self.clip.clone()
    }

    fn normalized_position(&self) -> f32 {
        self.position
    }

    fn seek(&mut self, clip: &ClipId, normalized: f32) {
        self.clip = Some(clip.clone());
        self.position = normalized;
        self.seeks.push((clip.clone(), normalized));
    }

    fn restart(&mut self, clip: &ClipId) {
        self.clip = Some(clip.clone());
        self.position = 0.0;
        self.restarts.push(clip.clone());
    }
}
