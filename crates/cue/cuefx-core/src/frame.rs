//! Integer frame tracking over a playback clock.
//!
//! Outside authoring the frame is derived from the clock's normalized position. In authoring
//! the tracker owns the frame: scrub requests are folded into range and pushed to the clock
//! as seeks, and a clip change forces a restart at frame 0.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::clock::{ClipCatalog, ClipInfo, PlaybackClock};
use crate::ids::ClipId;

/// Frame reported for one tick.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSample {
    pub clip: ClipId,
    pub frame: u32,
    pub total_frames: u32,
    /// The tracker restarted the clip from frame 0 this tick.
    pub restarted: bool,
}

/// Wrap a normalized position into `[0, 1)` for looping clips.
///
/// Non-looping clips keep their position; the frame clamp handles the overshoot.
#[inline]
pub fn wrap_position(position: f32, looping: bool) -> f32 {
    if !position.is_finite() {
        return 0.0;
    }
    if looping {
        position.rem_euclid(1.0)
    } else {
        position
    }
}

/// Relative slack absorbed before flooring. A position stored as f32 can land just under the
/// frame it was sought to when the span is fractional.
const FRAME_SLACK: f64 = 1e-6;

/// `floor(wrapped * frame_rate * length)`, clamped to `[0, total_frames - 1]`.
pub fn frame_at(info: &ClipInfo, position: f32) -> u32 {
    let total = info.total_frames();
    if total == 0 {
        return 0;
    }
    let raw = f64::from(wrap_position(position, info.looping)) * f64::from(info.span_frames());
    let raw = (raw * (1.0 + FRAME_SLACK)).floor();
    if raw <= 0.0 {
        0
    } else {
        (raw as u32).min(total - 1)
    }
}

/// Fold an authoring frame request into `[0, total_frames - 1]`.
///
/// Negative requests clamp to 0; requests past the end wrap by `total_frames`.
pub fn fold_requested(requested: i64, total: u32) -> u32 {
    if total == 0 || requested <= 0 {
        return 0;
    }
    let total = i64::from(total);
    let frame = if requested > total - 1 {
        requested % total
    } else {
        requested
    };
    frame as u32
}

#[derive(Clone, Debug, Default)]
pub struct FrameTracker {
    frame: u32,
    total_frames: u32,
    requested: i64,
    displayed: Option<ClipId>,
    pending_clip: Option<ClipId>,
}

impl FrameTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frame reported by the last successful sample.
    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn total_frames(&self) -> u32 {
        self.total_frames
    }

    /// Clip shown by the last successful sample.
    pub fn displayed_clip(&self) -> Option<&ClipId> {
        self.displayed.as_ref()
    }

    /// Raw authoring request, before folding.
    pub fn requested_frame(&self) -> i64 {
        self.requested
    }

    /// Request an authoring frame. Out-of-range values are folded on the next sample.
    pub fn set_frame(&mut self, frame: i64) {
        self.requested = frame;
    }

    /// Scrub relative to the current request.
    pub fn step_frame(&mut self, delta: i64) {
        self.requested = self.requested.saturating_add(delta);
    }

    /// Ask for `clip` to be restarted at frame 0 on the next authoring sample.
    pub fn request_clip(&mut self, clip: ClipId) {
        self.pending_clip = Some(clip);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Sample the clock for this tick. `None` means not ready: the clock is disabled, nothing
    /// is playing, or the clip is unknown or empty.
    pub fn sample(
        &mut self,
        authoring: bool,
        clock: &mut dyn PlaybackClock,
        clips: &dyn ClipCatalog,
    ) -> Option<FrameSample> {
        if !clock.is_enabled() {
            return None;
        }

        if authoring {
            if let Some(clip) = self.pending_clip.take() {
                return self.restart(clip, clock, clips);
            }
        }

        let clip = clock.current_clip()?;
        let info = clips.clip(&clip).filter(|i| i.total_frames() > 0)?;
        let total = info.total_frames();

        if !authoring {
            let frame = frame_at(&info, clock.normalized_position());
            self.frame = frame;
            self.requested = i64::from(frame);
            self.total_frames = total;
            self.displayed = Some(clip.clone());
            return Some(FrameSample {
                clip,
                frame,
                total_frames: total,
                restarted: false,
            });
        }

        if self.displayed.as_ref() != Some(&clip) {
            debug!("clip changed to {clip}; restarting at frame 0");
            return self.restart(clip, clock, clips);
        }

        let frame = fold_requested(self.requested, total);
        self.requested = i64::from(frame);
        self.frame = frame;
        self.total_frames = total;
        clock.seek(&clip, info.position_of(frame));
        Some(FrameSample {
            clip,
            frame,
            total_frames: total,
            restarted: false,
        })
    }

    fn restart(
        &mut self,
        clip: ClipId,
        clock: &mut dyn PlaybackClock,
        clips: &dyn ClipCatalog,
    ) -> Option<FrameSample> {
        let info = clips.clip(&clip).filter(|i| i.total_frames() > 0)?;
        clock.restart(&clip);
        self.frame = 0;
        self.requested = 0;
        self.total_frames = info.total_frames();
        self.displayed = Some(clip.clone());
        Some(FrameSample {
            clip,
            frame: 0,
            total_frames: self.total_frames,
            restarted: true,
        })
    }
}
