use serde::{Deserialize, Serialize};

use crate::frame::FrameSample;
use crate::ids::{ClipId, EventId, NodeId};

/// Things that happened during one update, in the order they happened.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum TickEvent {
    /// Playback went back before the trigger frame; the event can fire again.
    Rearmed { event: EventId },
    /// The event crossed its trigger frame. `instance` is the freshly spawned node, if any.
    Fired {
        event: EventId,
        frame: u32,
        instance: Option<NodeId>,
    },
    /// A previous instance was destroyed to make room for a new one.
    Destroyed { event: EventId, instance: NodeId },
    /// The tracker restarted a clip at frame 0.
    ClipRestarted { clip: ClipId },
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Outputs {
    /// Frame evaluated this tick; `None` when the host was not ready.
    pub frame: Option<FrameSample>,
    /// Rate to apply to the shared time scale; `None` when this engine is not governing.
    pub time_scale: Option<f32>,
    pub events: Vec<TickEvent>,
}

impl Outputs {
    pub fn clear(&mut self) {
        self.frame = None;
        self.time_scale = None;
        self.events.clear();
    }

    #[inline]
    pub fn push_event(&mut self, event: TickEvent) {
        self.events.push(event);
    }

    /// Events that fired this tick.
    pub fn fired(&self) -> impl Iterator<Item = EventId> + '_ {
        self.events.iter().filter_map(|e| match e {
            TickEvent::Fired { event, .. } => Some(*event),
            _ => None,
        })
    }

    pub fn is_ready(&self) -> bool {
        self.frame.is_some()
    }
}
