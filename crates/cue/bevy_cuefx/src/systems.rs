use bevy::log::debug;
use bevy::prelude::*;
use cuefx_core::{
    CallbackInvoker, CallbackSet, Host, PlaybackClock, SnapshotStore, TickEvent,
};

use crate::components::CueOwner;
use crate::events::{CueCallback, CueFired};
use crate::resources::{clip_info, CueClips, CueEngines, CueModes, CuefxPluginConfig};
use crate::scene::{node_to_entity, WorldScene};

/// Collects callback names during an update so they can be sent as Bevy events afterwards.
#[derive(Default)]
struct CallbackQueue {
    names: Vec<String>,
}

impl CallbackInvoker for CallbackQueue {
    fn invoke(&mut self, callbacks: &CallbackSet) {
        self.names.extend(callbacks.iter().map(str::to_string));
    }
}

/// Advance every emitter's clip by virtual time.
pub fn advance_playback_system(
    time: Res<Time>,
    clips: Res<CueClips>,
    mut engines: ResMut<CueEngines>,
) {
    let dt = time.delta_seconds();
    for emitter in engines.emitters.iter_mut() {
        let Some(playback) = emitter.playback.as_mut() else {
            continue;
        };
        if let Some(info) = clip_info(&clips, playback.clip.as_ref()) {
            playback.advance(&info, dt);
        }
    }
}

/// Tick every cue engine against the world: frame evaluation, spawns, callbacks, time scale.
pub fn tick_cue_engines_system(world: &mut World) {
    if !world.contains_resource::<CueEngines>() {
        return;
    }
    let apply_time_scale = world
        .get_resource::<CuefxPluginConfig>()
        .map_or(true, |c| c.apply_time_scale);
    world.resource_scope(|world, mut engines: Mut<CueEngines>| {
        world.resource_scope(|world, mut modes: Mut<CueModes>| {
            world.resource_scope(|world, clips: Mut<CueClips>| {
                for emitter in engines.emitters.iter_mut() {
                    if !emitter.activated {
                        emitter.engine.activate(&mut modes.0);
                        emitter.activated = true;
                    }

                    let engine_id = emitter.engine.id();
                    let mut queue = CallbackQueue::default();
                    let outputs = {
                        let mut scene = WorldScene::new(world, engine_id);
                        let mut host = Host {
                            clock: emitter
                                .playback
                                .as_mut()
                                .map(|p| p as &mut dyn PlaybackClock),
                            clips: &clips.0,
                            scene: &mut scene,
                            callbacks: &mut queue,
                        };
                        emitter.engine.update(&mut host, &mut modes.0).clone()
                    };

                    if let Some(rate) = outputs.time_scale.filter(|_| apply_time_scale) {
                        if let Some(mut virt) = world.get_resource_mut::<Time<Virtual>>() {
                            if virt.relative_speed() != rate {
                                virt.set_relative_speed(rate);
                            }
                        }
                    }

                    for event in &outputs.events {
                        if let TickEvent::Fired {
                            event,
                            frame,
                            instance,
                        } = event
                        {
                            let instance = instance.and_then(node_to_entity);
                            if let Some(entity) = instance {
                                if let Some(mut e) = world.get_entity_mut(entity) {
                                    e.insert(CueOwner { event: *event });
                                }
                            }
                            world.send_event(CueFired {
                                engine: engine_id,
                                owner: emitter.owner,
                                event: *event,
                                frame: *frame,
                                instance,
                            });
                        }
                    }
                    for name in queue.names {
                        world.send_event(CueCallback {
                            engine: engine_id,
                            owner: emitter.owner,
                            name,
                        });
                    }
                }
            });
        });
    });
}

/// Write a snapshot for every engine (before the host tears them down).
pub fn save_engines(world: &World, store: &mut dyn SnapshotStore) -> cuefx_core::Result<usize> {
    let Some(engines) = world.get_resource::<CueEngines>() else {
        return Ok(0);
    };
    cuefx_core::save_all(engines.engines(), store)
}

/// Restore every engine that has a snapshot. Restored engines re-activate on their next tick.
pub fn restore_engines(
    world: &mut World,
    store: &mut dyn SnapshotStore,
) -> cuefx_core::Result<usize> {
    let Some(mut engines) = world.get_resource_mut::<CueEngines>() else {
        return Ok(0);
    };
    let restored = cuefx_core::restore_all(engines.engines_mut(), store)?;
    for emitter in engines.emitters.iter_mut() {
        emitter.activated = false;
    }
    debug!("restored {restored} cue engine(s)");
    Ok(restored)
}
