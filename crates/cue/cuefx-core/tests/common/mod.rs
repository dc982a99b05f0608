#![allow(dead_code)]

use cuefx_core::{
    CallbackRegistry, CallbackSet, ClipCatalog, ClipId, ClipLibrary, Config, Engine, EventId,
    Host, ManualClock, ModeRegistry, NodeId, Outputs, PlaybackClock, Pose, PrefabRef, SceneGraph,
};

/// Engine plus in-memory host pieces.
pub struct Rig {
    pub clips: ClipLibrary,
    pub clock: ManualClock,
    pub scene: SceneGraph,
    pub callbacks: CallbackRegistry,
    pub modes: ModeRegistry,
    pub engine: Engine,
}

impl Rig {
    pub fn new(cfg: Config) -> Self {
        let clips: ClipLibrary = cuefx_test_fixtures::clips::load("locomotion").unwrap();
        let mut scene = SceneGraph::new();
        scene.register_prefab(PrefabRef::new("Dust"), Pose::IDENTITY);
        scene.register_prefab(PrefabRef::new("Sparks"), Pose::from_position([0.0, 2.0, 0.0]));
        Self {
            clips,
            clock: ManualClock::playing("Jump"),
            scene,
            callbacks: CallbackRegistry::new(),
            modes: ModeRegistry::new(),
            engine: Engine::new(cfg),
        }
    }

    pub fn tick(&mut self) -> Outputs {
        let mut host = Host::new(
            &mut self.clock,
            &self.clips,
            &mut self.scene,
            &mut self.callbacks,
        );
        self.engine.update(&mut host, &mut self.modes).clone()
    }

    /// Play-mode tick that lands in the middle of `frame` on the current clip.
    pub fn tick_frame(&mut self, frame: u32) -> Outputs {
        let clip = self.clock.current_clip().expect("clock should be playing");
        let info = self.clips.clip(&clip).expect("clip should exist");
        self.clock.set_position((frame as f32 + 0.5) / info.span_frames());
        self.tick()
    }

    /// Authoring tick at a scrubbed frame.
    pub fn scrub(&mut self, frame: i64) -> Outputs {
        self.engine.scrub_to(frame);
        self.tick()
    }

    /// Event on `clip` with a prefab and trigger frame.
    pub fn prefab_event(&mut self, clip: &str, prefab: &str, frame: i64) -> EventId {
        let id = self.engine.add_event(Some(ClipId::new(clip)));
        self.engine
            .set_prefab(id, Some(PrefabRef::new(prefab)), &self.scene)
            .unwrap();
        self.engine.set_trigger_frame(id, frame, &self.clips).unwrap();
        id
    }

    /// Event on `clip` with callbacks only.
    pub fn callback_event(&mut self, clip: &str, names: &[&str], frame: i64) -> EventId {
        let id = self.engine.add_event(Some(ClipId::new(clip)));
        self.engine
            .set_callbacks(id, CallbackSet::new(names.iter().copied()))
            .unwrap();
        self.engine.set_trigger_frame(id, frame, &self.clips).unwrap();
        id
    }

    pub fn live(&self, id: EventId) -> Option<NodeId> {
        self.engine.event(id).unwrap().live_instance()
    }
}
