//! The cue engine: one per animated character.
//!
//! Owns the event list, the frame tracker and the mode flags. `update` is called once per host
//! tick with the borrowed host ports and the shared [`ModeRegistry`]; everything else is the
//! authoring surface.

use log::{debug, info, warn};

use crate::clock::ClipCatalog;
use crate::config::Config;
use crate::error::CueError;
use crate::event::{CallbackSet, EventBundle, PayloadKind, PrefabRef};
use crate::frame::FrameTracker;
use crate::host::{Host, SceneHost};
use crate::ids::{ClipId, EngineId, EventId, IdAllocator, NodeId, SessionId};
use crate::modes::ModeRegistry;
use crate::outputs::{Outputs, TickEvent};
use crate::persistence::{Snapshot, SnapshotStore, SNAPSHOT_VERSION};
use crate::pose::Pose;
use crate::space::{convert_pose, PosePolicy};
use crate::spawn;
use crate::trigger::{Transition, TriggerState};
use crate::Result;

/// Direction for reordering an event in the list.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

#[derive(Debug)]
pub struct Engine {
    id: EngineId,
    session: SessionId,
    cfg: Config,
    ids: IdAllocator,
    authoring: bool,
    play_rate: f32,
    edit_rate: f32,
    events: Vec<EventBundle>,
    tracker: FrameTracker,
    warmup_pending: bool,
    outputs: Outputs,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Engine {
    pub fn new(cfg: Config) -> Self {
        Self::with_id(EngineId::next(), cfg)
    }

    /// Engine with a caller-chosen identity (e.g. one that survived a reload).
    pub fn with_id(id: EngineId, cfg: Config) -> Self {
        if let Err(e) = cfg.validate() {
            warn!("engine {id}: {e}; rates will be clamped");
        }
        let play_rate = cfg.clamp_rate(cfg.default_play_rate);
        let edit_rate = cfg.clamp_rate(cfg.default_edit_rate);
        Self {
            id,
            session: SessionId::default(),
            cfg,
            ids: IdAllocator::new(),
            authoring: false,
            play_rate,
            edit_rate,
            events: Vec::new(),
            tracker: FrameTracker::new(),
            warmup_pending: false,
            outputs: Outputs::default(),
        }
    }

    pub fn with_session(mut self, session: SessionId) -> Self {
        self.session = session;
        self
    }

    pub fn id(&self) -> EngineId {
        self.id
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn set_session(&mut self, session: SessionId) {
        self.session = session;
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn outputs(&self) -> &Outputs {
        &self.outputs
    }

    // ----- modes -----

    pub fn is_authoring(&self) -> bool {
        self.authoring
    }

    pub fn set_authoring(&mut self, authoring: bool) {
        if self.authoring != authoring {
            debug!("engine {}: authoring = {}", self.id, authoring);
        }
        self.authoring = authoring;
    }

    pub fn play_rate(&self) -> f32 {
        self.play_rate
    }

    pub fn edit_rate(&self) -> f32 {
        self.edit_rate
    }

    pub fn set_play_rate(&mut self, rate: f32) {
        self.play_rate = self.cfg.clamp_rate(rate);
    }

    pub fn set_edit_rate(&mut self, rate: f32) {
        self.edit_rate = self.cfg.clamp_rate(rate);
    }

    /// Become the governing engine of this engine's session and start the warm-up.
    pub fn activate(&self, modes: &mut ModeRegistry) {
        modes.activate(self.session, self.id, self.cfg.warmup_ticks);
    }

    pub fn deactivate(&self, modes: &mut ModeRegistry) -> bool {
        modes.deactivate(self.session, self.id)
    }

    // ----- frame / scrubbing -----

    pub fn current_frame(&self) -> u32 {
        self.tracker.frame()
    }

    pub fn total_frames(&self) -> u32 {
        self.tracker.total_frames()
    }

    pub fn displayed_clip(&self) -> Option<&ClipId> {
        self.tracker.displayed_clip()
    }

    /// Request an authoring frame; folded into range on the next update.
    pub fn scrub_to(&mut self, frame: i64) {
        self.tracker.set_frame(frame);
    }

    /// Scrub relative to the current frame (the -2/-1/+1/+2 step controls).
    pub fn step_frame(&mut self, delta: i64) {
        self.tracker.step_frame(delta);
    }

    /// Pick a clip to author; it restarts at frame 0 on the next authoring update.
    pub fn request_clip(&mut self, clip: ClipId) {
        self.tracker.request_clip(clip);
    }

    /// Whether the event belongs to the clip currently displayed.
    pub fn is_on_active_clip(&self, id: EventId) -> Result<bool> {
        let event = self.event_ref(id)?;
        Ok(event.clip.is_some() && event.clip.as_ref() == self.tracker.displayed_clip())
    }

    /// Scrub to the event's trigger frame. Only meaningful in authoring on the event's clip.
    pub fn jump_to_trigger_frame(&mut self, id: EventId) -> Result<bool> {
        if !self.authoring || !self.is_on_active_clip(id)? {
            return Ok(false);
        }
        let frame = self.event_ref(id)?.trigger_frame;
        self.tracker.set_frame(i64::from(frame));
        Ok(true)
    }

    /// Set the event's trigger frame to the frame currently shown.
    pub fn set_trigger_frame_to_current(
        &mut self,
        id: EventId,
        clips: &dyn ClipCatalog,
    ) -> Result<u32> {
        let frame = self.tracker.frame();
        self.set_trigger_frame(id, i64::from(frame), clips)
    }

    // ----- event list -----

    pub fn events(&self) -> &[EventBundle] {
        &self.events
    }

    pub fn event(&self, id: EventId) -> Option<&EventBundle> {
        self.events.iter().find(|e| e.id == id)
    }

    fn event_ref(&self, id: EventId) -> Result<&EventBundle> {
        self.event(id).ok_or(CueError::EventNotFound { id })
    }

    fn event_mut(&mut self, id: EventId) -> Result<&mut EventBundle> {
        self.events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(CueError::EventNotFound { id })
    }

    fn index_of(&self, id: EventId) -> Result<usize> {
        self.events
            .iter()
            .position(|e| e.id == id)
            .ok_or(CueError::EventNotFound { id })
    }

    /// Append a fresh event (enabled, relative, identity pose) bound to `clip`.
    pub fn add_event(&mut self, clip: Option<ClipId>) -> EventId {
        let id = self.ids.alloc_event();
        self.events.push(EventBundle::new(id, clip));
        id
    }

    /// Remove an event, destroying its live instance.
    pub fn remove_event(&mut self, id: EventId, scene: &mut dyn SceneHost) -> Result<EventBundle> {
        let index = self.index_of(id)?;
        let mut event = self.events.remove(index);
        spawn::destroy(&mut event, scene);
        Ok(event)
    }

    /// Swap the event with its neighbour. `Ok(false)` at either end of the list.
    pub fn move_event(&mut self, id: EventId, direction: MoveDirection) -> Result<bool> {
        let index = self.index_of(id)?;
        let other = match direction {
            MoveDirection::Up if index > 0 => index - 1,
            MoveDirection::Down if index + 1 < self.events.len() => index + 1,
            _ => return Ok(false),
        };
        self.events.swap(index, other);
        Ok(true)
    }

    pub fn set_name(&mut self, id: EventId, name: impl Into<String>) -> Result<()> {
        self.event_mut(id)?.name = name.into();
        Ok(())
    }

    /// Disabling destroys the live instance.
    pub fn set_enabled(
        &mut self,
        id: EventId,
        enabled: bool,
        scene: &mut dyn SceneHost,
    ) -> Result<Option<NodeId>> {
        let event = self.event_mut(id)?;
        event.enabled = enabled;
        if enabled {
            Ok(None)
        } else {
            Ok(spawn::destroy(event, scene))
        }
    }

    /// Rebind the event to another clip, re-clamping its trigger frame.
    pub fn set_clip(&mut self, id: EventId, clip: Option<ClipId>, clips: &dyn ClipCatalog) -> Result<()> {
        let event = self.event_mut(id)?;
        event.clip = clip;
        event.state = TriggerState::Armed;
        let frame = i64::from(event.trigger_frame);
        self.set_trigger_frame(id, frame, clips)?;
        Ok(())
    }

    /// Set the trigger frame, clamped to `[0, total_frames - 1]` of the event's clip.
    pub fn set_trigger_frame(
        &mut self,
        id: EventId,
        frame: i64,
        clips: &dyn ClipCatalog,
    ) -> Result<u32> {
        let event = self.event_mut(id)?;
        let last = event
            .clip
            .as_ref()
            .and_then(|c| clips.clip(c))
            .map(|info| i64::from(info.last_frame()));
        let clamped = match last {
            Some(last) => frame.clamp(0, last),
            None => frame.clamp(0, i64::from(u32::MAX)),
        } as u32;
        event.trigger_frame = clamped;
        Ok(clamped)
    }

    /// Set or clear the anchor.
    ///
    /// Rejected when the anchor is unknown, an asset, or any event's live instance. Setting an
    /// anchor where there was none turns on `keep_anchor_relative`; clearing it turns it off.
    /// The stored pose is re-expressed in the new frame so the event stays in place.
    pub fn set_anchor(
        &mut self,
        id: EventId,
        anchor: Option<NodeId>,
        scene: &mut dyn SceneHost,
    ) -> Result<()> {
        if let Some(a) = anchor {
            if let Err(e) = self.validate_anchor(a, scene) {
                warn!("engine {}: event {id}: {e}", self.id);
                return Err(e);
            }
        }
        let policy = self.cfg.pose_policy;
        let event = self.event_mut(id)?;
        if event.anchor == anchor {
            return Ok(());
        }
        let relative = match (event.anchor, anchor) {
            (None, Some(_)) => true,
            (_, None) => false,
            (Some(_), Some(_)) => event.keep_anchor_relative,
        };
        rebase(event, anchor, relative, scene, policy);
        Ok(())
    }

    fn validate_anchor(&self, anchor: NodeId, scene: &dyn SceneHost) -> Result<()> {
        if !scene.contains(anchor) {
            return Err(CueError::UnknownAnchor { anchor });
        }
        if scene.is_asset(anchor) {
            return Err(CueError::AnchorIsAsset { anchor });
        }
        if let Some(owner) = self.events.iter().find(|e| e.live == Some(anchor)) {
            return Err(CueError::AnchorIsLiveInstance {
                anchor,
                owner: owner.id,
            });
        }
        Ok(())
    }

    /// Toggle whether the live instance stays parented to the anchor. Forced off while the
    /// event has no anchor.
    pub fn set_keep_anchor_relative(
        &mut self,
        id: EventId,
        relative: bool,
        scene: &mut dyn SceneHost,
    ) -> Result<()> {
        let policy = self.cfg.pose_policy;
        let event = self.event_mut(id)?;
        // Without an anchor there is nothing to stay relative to.
        let relative = relative && event.anchor.is_some();
        if event.keep_anchor_relative == relative {
            return Ok(());
        }
        let anchor = event.anchor;
        rebase(event, anchor, relative, scene, policy);
        Ok(())
    }

    /// Set or clear the prefab. The event takes the prefab's name; the first prefab also seeds
    /// the stored pose from the prefab's authored pose.
    pub fn set_prefab(
        &mut self,
        id: EventId,
        prefab: Option<PrefabRef>,
        scene: &dyn SceneHost,
    ) -> Result<()> {
        let policy = self.cfg.pose_policy;
        let event = self.event_mut(id)?;
        match &prefab {
            Some(p) => {
                event.name = p.name().to_string();
                if event.payload.prefab.is_none() {
                    if let Some(world) = scene.prefab_pose(p) {
                        let to = event.anchor.and_then(|a| scene.local_to_world(a));
                        event.pose = convert_pose(&world, None, to.as_ref(), policy);
                    }
                }
            }
            None => event.name.clear(),
        }
        event.payload.prefab = prefab;
        Ok(())
    }

    pub fn set_callbacks(&mut self, id: EventId, callbacks: CallbackSet) -> Result<()> {
        self.event_mut(id)?.payload.callbacks = callbacks;
        Ok(())
    }

    pub fn set_presented(&mut self, id: EventId, kind: PayloadKind) -> Result<()> {
        self.event_mut(id)?.payload.presented = kind;
        Ok(())
    }

    /// Edit the stored pose and push it onto the live instance.
    pub fn set_pose(&mut self, id: EventId, pose: Pose, scene: &mut dyn SceneHost) -> Result<()> {
        let policy = self.cfg.pose_policy;
        let event = self.event_mut(id)?;
        event.pose = pose;
        spawn::place(event, scene, policy);
        Ok(())
    }

    /// Back to the identity pose; a live instance is respawned with it.
    pub fn reset_pose(&mut self, id: EventId, scene: &mut dyn SceneHost) -> Result<Option<NodeId>> {
        let policy = self.cfg.pose_policy;
        let event = self.event_mut(id)?;
        event.pose = Pose::IDENTITY;
        if event.live.is_none() {
            return Ok(None);
        }
        let spawned = spawn::fire(event, scene, policy).spawned;
        self.note_manual_spawn(spawned);
        Ok(spawned)
    }

    /// Copy another node's local pose into the event.
    pub fn copy_local_pose_from(
        &mut self,
        id: EventId,
        node: NodeId,
        scene: &mut dyn SceneHost,
    ) -> Result<()> {
        let pose = scene
            .local_pose(node)
            .ok_or(CueError::UnknownAnchor { anchor: node })?;
        self.set_pose(id, pose, scene)
    }

    /// Copy another node's world pose into the event.
    pub fn copy_world_pose_from(
        &mut self,
        id: EventId,
        node: NodeId,
        scene: &mut dyn SceneHost,
    ) -> Result<()> {
        let pose = scene
            .world_pose(node)
            .ok_or(CueError::UnknownAnchor { anchor: node })?;
        self.set_pose(id, pose, scene)
    }

    // ----- spawning -----

    /// Spawn the event's prefab right now, outside of frame evaluation.
    pub fn fire(&mut self, id: EventId, scene: &mut dyn SceneHost) -> Result<Option<NodeId>> {
        let policy = self.cfg.pose_policy;
        let event = self.event_mut(id)?;
        let spawned = spawn::fire(event, scene, policy).spawned;
        self.note_manual_spawn(spawned);
        Ok(spawned)
    }

    /// A spawn made while authoring restarts the warm-up on the next tick.
    fn note_manual_spawn(&mut self, spawned: Option<NodeId>) {
        if self.authoring && spawned.is_some() {
            self.warmup_pending = true;
        }
    }

    pub fn destroy(&mut self, id: EventId, scene: &mut dyn SceneHost) -> Result<Option<NodeId>> {
        Ok(spawn::destroy(self.event_mut(id)?, scene))
    }

    pub fn destroy_all(&mut self, scene: &mut dyn SceneHost) -> usize {
        spawn::destroy_all(&mut self.events, scene)
    }

    /// Destroy every instance, re-arm every event and restart the current clip at frame 0.
    pub fn restart_from_beginning(&mut self, host: &mut Host<'_>) {
        let destroyed = self.destroy_all(host.scene);
        for event in &mut self.events {
            event.state = TriggerState::Armed;
        }
        self.tracker.set_frame(0);
        if let Some(clock) = host.clock.as_deref_mut() {
            if let Some(clip) = clock.current_clip() {
                clock.restart(&clip);
            }
        }
        debug!(
            "engine {}: restarted from beginning ({destroyed} instance(s) destroyed)",
            self.id
        );
    }

    /// Re-read stored poses from live instances, so hand-moved instances are captured.
    pub fn sync_poses_from_instances(&mut self, scene: &dyn SceneHost) {
        let policy = self.cfg.pose_policy;
        for event in &mut self.events {
            if let Some(pose) = spawn::read_back(event, scene, policy) {
                event.pose = pose;
            }
        }
    }

    // ----- tick -----

    /// Evaluate one tick.
    pub fn update(&mut self, host: &mut Host<'_>, modes: &mut ModeRegistry) -> &Outputs {
        self.outputs.clear();

        if self.warmup_pending {
            modes.restart_warmup(self.session, self.id, self.cfg.warmup_ticks);
            self.warmup_pending = false;
        }

        let Some(clock) = host.clock.as_deref_mut() else {
            return &self.outputs;
        };
        let Some(sample) = self.tracker.sample(self.authoring, clock, host.clips) else {
            return &self.outputs;
        };

        if sample.restarted {
            self.outputs.push_event(TickEvent::ClipRestarted {
                clip: sample.clip.clone(),
            });
        }
        self.outputs.time_scale = modes.rate_for(
            self.session,
            self.id,
            self.authoring,
            self.edit_rate,
            self.play_rate,
        );

        let policy = self.cfg.pose_policy;
        for event in self.events.iter_mut() {
            if !event.enabled || event.clip.as_ref() != Some(&sample.clip) {
                continue;
            }
            match event.state.step(sample.frame, event.trigger_frame) {
                Transition::None => {}
                Transition::Rearmed => {
                    debug!("event {} re-armed at frame {}", event.id, sample.frame);
                    self.outputs.push_event(TickEvent::Rearmed { event: event.id });
                }
                Transition::Fired => {
                    debug!("event {} fired at frame {}", event.id, sample.frame);
                    let outcome = spawn::fire(event, host.scene, policy);
                    if let Some(instance) = outcome.destroyed {
                        self.outputs.push_event(TickEvent::Destroyed {
                            event: event.id,
                            instance,
                        });
                    }
                    if !event.payload.callbacks.is_empty() {
                        host.callbacks.invoke(&event.payload.callbacks);
                    }
                    self.outputs.push_event(TickEvent::Fired {
                        event: event.id,
                        frame: sample.frame,
                        instance: outcome.spawned,
                    });
                    if self.authoring && outcome.spawned.is_some() {
                        self.warmup_pending = true;
                    }
                }
            }
        }

        if self.cfg.sync_pose_from_instances {
            self.sync_poses_from_instances(host.scene);
        }

        self.outputs.frame = Some(sample);
        &self.outputs
    }

    // ----- persistence -----

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            version: SNAPSHOT_VERSION,
            authoring: self.authoring,
            play_rate: self.play_rate,
            edit_rate: self.edit_rate,
            events: self.events.clone(),
        }
    }

    /// Replace the event list and mode fields with a snapshot's. Transient state is cleared.
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) {
        if snapshot.version != SNAPSHOT_VERSION {
            warn!(
                "engine {}: snapshot version {} (expected {})",
                self.id, snapshot.version, SNAPSHOT_VERSION
            );
        }
        self.authoring = snapshot.authoring;
        self.play_rate = self.cfg.clamp_rate(snapshot.play_rate);
        self.edit_rate = self.cfg.clamp_rate(snapshot.edit_rate);
        self.events = snapshot.events;
        self.ids.reset();
        for event in &mut self.events {
            event.live = None;
            event.state = TriggerState::Armed;
            self.ids.observe(event.id);
        }
        self.tracker.reset();
        self.warmup_pending = false;
    }

    pub fn save_state(&self, store: &mut dyn SnapshotStore) -> Result<()> {
        let blob = self.snapshot().to_bytes()?;
        store.write(self.id, &blob)?;
        debug!("engine {}: saved {} event(s)", self.id, self.events.len());
        Ok(())
    }

    /// Load and delete this engine's record. `Ok(false)` when there is none.
    pub fn restore_state(&mut self, store: &mut dyn SnapshotStore) -> Result<bool> {
        let Some(blob) = store.read(self.id)? else {
            return Ok(false);
        };
        let snapshot = Snapshot::from_bytes(&blob)?;
        self.apply_snapshot(snapshot);
        store.delete(self.id)?;
        info!("engine {}: restored {} event(s)", self.id, self.events.len());
        Ok(true)
    }
}

/// Move an event to a new anchor / relative setting while keeping it visually in place.
///
/// With a live instance the scene is authoritative: the instance is reparented and its
/// placement read back. Otherwise the stored pose is converted between anchor frames.
fn rebase(
    event: &mut EventBundle,
    anchor: Option<NodeId>,
    relative: bool,
    scene: &mut dyn SceneHost,
    policy: PosePolicy,
) {
    let live = event.live.filter(|i| scene.contains(*i));
    match live {
        Some(instance) => {
            let attach = anchor.filter(|_| relative);
            scene.set_parent(instance, attach);
            event.anchor = anchor;
            event.keep_anchor_relative = relative;
            if let Some(pose) = spawn::read_back(event, scene, policy) {
                event.pose = pose;
            }
        }
        None => {
            if event.anchor != anchor {
                let from = event.anchor.and_then(|a| scene.local_to_world(a));
                let to = anchor.and_then(|a| scene.local_to_world(a));
                event.pose = convert_pose(&event.pose, from.as_ref(), to.as_ref(), policy);
            }
            event.anchor = anchor;
            event.keep_anchor_relative = relative;
        }
    }
}
