use bevy::prelude::*;
use cuefx_core::{EngineId, EventId, PrefabRef};

/// Marks an entity spawned by a cue event.
#[derive(Component, Debug, Clone)]
pub struct CueInstance {
    pub engine: EngineId,
    pub prefab: PrefabRef,
}

/// Marks an asset-like entity that must not be used as an anchor.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct CueAsset;

/// Attached to spawned instances once the engine has recorded them.
#[derive(Component, Debug, Clone, Copy)]
pub struct CueOwner {
    pub event: EventId,
}
