//! Bevy host for `cuefx-core`.
//!
//! Add [`CuefxPlugin`], register clips in [`CueClips`] and prefabs in [`PrefabLibrary`], then
//! push [`CueEmitter`]s into [`CueEngines`]. Each `Update` the clip players advance by virtual
//! time and every engine is ticked against the world; fired cues and callbacks come out as
//! [`CueFired`] and [`CueCallback`] events, and the governing engine drives
//! `Time<Virtual>`'s relative speed.

use bevy::prelude::*;

pub mod components;
pub mod events;
pub mod resources;
pub mod scene;
pub mod systems;

pub use components::{CueAsset, CueInstance, CueOwner};
pub use events::{CueCallback, CueFired};
pub use resources::{
    ClipPlayback, CueClips, CueEmitter, CueEngines, CueModes, CuefxPluginConfig, PrefabLibrary,
    PrefabTemplate,
};
pub use scene::{entity_to_node, node_to_entity, pose_to_transform, transform_to_pose, WorldScene};
pub use systems::{restore_engines, save_engines};

/// Ordering for the cue systems inside `Update`.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum CueSet {
    Advance,
    Evaluate,
}

#[derive(Default)]
pub struct CuefxPlugin {
    /// Initial clip catalog.
    pub clips: cuefx_core::ClipLibrary,
    pub config: CuefxPluginConfig,
}

impl Plugin for CuefxPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(CueClips(self.clips.clone()))
            .insert_resource(self.config.clone())
            .init_resource::<CueModes>()
            .init_resource::<CueEngines>()
            .init_resource::<PrefabLibrary>()
            .add_event::<CueCallback>()
            .add_event::<CueFired>()
            .configure_sets(Update, (CueSet::Advance, CueSet::Evaluate).chain())
            .add_systems(
                Update,
                (
                    systems::advance_playback_system.in_set(CueSet::Advance),
                    systems::tick_cue_engines_system.in_set(CueSet::Evaluate),
                ),
            );
    }
}
