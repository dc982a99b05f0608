use bevy::prelude::*;
use cuefx_core::{EngineId, EventId};

/// A callback named by a fired cue event.
#[derive(Event, Clone, Debug)]
pub struct CueCallback {
    pub engine: EngineId,
    pub owner: Option<Entity>,
    pub name: String,
}

/// A cue event crossed its trigger frame.
#[derive(Event, Clone, Debug)]
pub struct CueFired {
    pub engine: EngineId,
    pub owner: Option<Entity>,
    pub event: EventId,
    pub frame: u32,
    /// Entity spawned for the event, if it has a prefab.
    pub instance: Option<Entity>,
}
