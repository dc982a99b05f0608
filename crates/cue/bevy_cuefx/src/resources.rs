use bevy::prelude::*;
use cuefx_core::{
    ClipCatalog, ClipId, ClipInfo, ClipLibrary, Config, Engine, EngineId, ModeRegistry,
    PlaybackClock, PrefabRef,
};
use std::collections::HashMap;

/// Clip timing catalog shared by all emitters.
#[derive(Resource, Default, Debug, Clone)]
pub struct CueClips(pub ClipLibrary);

/// Plugin-wide settings.
#[derive(Resource, Debug, Clone)]
pub struct CuefxPluginConfig {
    /// Let the governing engine drive `Time<Virtual>`'s relative speed.
    pub apply_time_scale: bool,
    /// Configuration for engines built through [`CuefxPluginConfig::new_engine`].
    pub engine: Config,
}

impl Default for CuefxPluginConfig {
    fn default() -> Self {
        Self {
            apply_time_scale: true,
            engine: Config::default(),
        }
    }
}

impl CuefxPluginConfig {
    pub fn new_engine(&self) -> Engine {
        Engine::new(self.engine.clone())
    }
}

/// Governing-instance registry for the shared time scale.
#[derive(Resource, Default, Debug)]
pub struct CueModes(pub ModeRegistry);

/// What to spawn for a prefab reference.
#[derive(Clone, Debug)]
pub struct PrefabTemplate {
    pub transform: Transform,
}

/// Prefabs the cue engines can instantiate.
#[derive(Resource, Default, Debug, Clone)]
pub struct PrefabLibrary {
    pub templates: HashMap<PrefabRef, PrefabTemplate>,
}

impl PrefabLibrary {
    pub fn register(&mut self, name: impl Into<String>, transform: Transform) -> PrefabRef {
        let prefab = PrefabRef::new(name);
        self.templates
            .insert(prefab.clone(), PrefabTemplate { transform });
        prefab
    }

    pub fn get(&self, prefab: &PrefabRef) -> Option<&PrefabTemplate> {
        self.templates.get(prefab)
    }
}

/// Minimal clip player driven by virtual time; the clock an emitter's engine reads.
#[derive(Clone, Debug)]
pub struct ClipPlayback {
    pub enabled: bool,
    pub clip: Option<ClipId>,
    /// Normalized position; grows past 1 on looping clips.
    pub position: f32,
    pub speed: f32,
}

impl Default for ClipPlayback {
    fn default() -> Self {
        Self {
            enabled: true,
            clip: None,
            position: 0.0,
            speed: 1.0,
        }
    }
}

impl ClipPlayback {
    pub fn playing(clip: impl Into<ClipId>) -> Self {
        Self {
            clip: Some(clip.into()),
            ..Self::default()
        }
    }

    pub fn advance(&mut self, info: &ClipInfo, dt: f32) {
        if self.enabled && info.length > 0.0 {
            self.position += dt * self.speed / info.length;
        }
    }
}

impl PlaybackClock for ClipPlayback {
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
    }

    fn restart(&mut self, clip: &ClipId) {
        self.clip = Some(clip.clone());
        self.position = 0.0;
    }
}

/// One cue engine plus the clip player it follows.
#[derive(Debug)]
pub struct CueEmitter {
    /// Character entity the engine belongs to, reported on outgoing events.
    pub owner: Option<Entity>,
    pub engine: Engine,
    /// `None` when the character has no animator; the engine idles.
    pub playback: Option<ClipPlayback>,
    pub(crate) activated: bool,
}

impl CueEmitter {
    pub fn new(engine: Engine, playback: Option<ClipPlayback>) -> Self {
        Self {
            owner: None,
            engine,
            playback,
            activated: false,
        }
    }

    pub fn with_owner(mut self, owner: Entity) -> Self {
        self.owner = Some(owner);
        self
    }
}

/// All live cue engines. Engines added later take over rate control on their first tick.
#[derive(Resource, Default, Debug)]
pub struct CueEngines {
    pub emitters: Vec<CueEmitter>,
}

impl CueEngines {
    pub fn add(&mut self, emitter: CueEmitter) -> EngineId {
        let id = emitter.engine.id();
        self.emitters.push(emitter);
        id
    }

    pub fn get(&self, id: EngineId) -> Option<&CueEmitter> {
        self.emitters.iter().find(|e| e.engine.id() == id)
    }

    pub fn get_mut(&mut self, id: EngineId) -> Option<&mut CueEmitter> {
        self.emitters.iter_mut().find(|e| e.engine.id() == id)
    }

    pub fn remove(&mut self, id: EngineId) -> Option<CueEmitter> {
        let index = self.emitters.iter().position(|e| e.engine.id() == id)?;
        Some(self.emitters.remove(index))
    }

    pub fn engines(&self) -> impl Iterator<Item = &Engine> {
        self.emitters.iter().map(|e| &e.engine)
    }

    pub fn engines_mut(&mut self) -> impl Iterator<Item = &mut Engine> {
        self.emitters.iter_mut().map(|e| &mut e.engine)
    }
}

/// Clip info lookup that tolerates a missing clip.
pub(crate) fn clip_info(clips: &CueClips, clip: Option<&ClipId>) -> Option<ClipInfo> {
    clip.and_then(|c| clips.0.clip(c))
}
