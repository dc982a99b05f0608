//! One-shot fire / re-arm state machine keyed on frame crossing.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerState {
    #[default]
    Armed,
    Fired,
}

/// What a single evaluation did to the state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    None,
    /// `Fired -> Armed` because playback went back before the trigger frame.
    Rearmed,
    /// `Armed -> Fired`: the only moment a spawn / callback happens.
    Fired,
}

impl TriggerState {
    #[inline]
    pub fn is_fired(self) -> bool {
        matches!(self, TriggerState::Fired)
    }

    /// Advance the state for the current frame.
    ///
    /// Being before the trigger frame always re-arms, which covers loop wrap-around and
    /// backward scrubbing alike. Staying at or past it once fired is a no-op.
    pub fn step(&mut self, frame: u32, trigger_frame: u32) -> Transition {
        if frame < trigger_frame {
            let was_fired = self.is_fired();
            *self = TriggerState::Armed;
            if was_fired {
                Transition::Rearmed
            } else {
                Transition::None
            }
        } else if *self == TriggerState::Armed {
            *self = TriggerState::Fired;
            Transition::Fired
        } else {
            Transition::None
        }
    }
}
