//! Host ports the engine talks to each tick.
//!
//! The engine never owns the scene, the clock or the callback targets. A host adapter (the
//! in-memory `SceneGraph`, the Bevy plugin, ...) implements these traits and lends them to
//! `Engine::update` through a [`Host`].

use nalgebra::Matrix4;

use crate::clock::{ClipCatalog, PlaybackClock};
use crate::event::{CallbackSet, PrefabRef};
use crate::ids::NodeId;
use crate::pose::Pose;

/// Scene operations needed to spawn, parent and place instances.
pub trait SceneHost {
    /// Create a new instance of `prefab`. `None` when the prefab cannot be instantiated.
    fn instantiate(&mut self, prefab: &PrefabRef) -> Option<NodeId>;

    /// Destroy a node and everything under it. Unknown nodes are ignored.
    fn destroy(&mut self, node: NodeId);

    fn contains(&self, node: NodeId) -> bool;

    /// True for asset handles that are not part of the live scene.
    fn is_asset(&self, node: NodeId) -> bool;

    /// Reparent `node` (`None` detaches it), preserving its world placement.
    fn set_parent(&mut self, node: NodeId, parent: Option<NodeId>);

    fn local_pose(&self, node: NodeId) -> Option<Pose>;

    fn world_pose(&self, node: NodeId) -> Option<Pose>;

    fn set_local_pose(&mut self, node: NodeId, pose: &Pose);

    fn set_world_pose(&mut self, node: NodeId, pose: &Pose);

    fn local_to_world(&self, node: NodeId) -> Option<Matrix4<f32>>;

    /// World pose authored on the prefab asset itself, used to seed new events.
    fn prefab_pose(&self, _prefab: &PrefabRef) -> Option<Pose> {
        None
    }
}

/// Invokes an event's zero-argument callbacks.
pub trait CallbackInvoker {
    fn invoke(&mut self, callbacks: &CallbackSet);
}

/// Callback sink that drops every call.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCallbacks;

impl CallbackInvoker for NoCallbacks {
    fn invoke(&mut self, _callbacks: &CallbackSet) {}
}

/// Everything the engine borrows from its host for one update.
///
/// A missing clock is the not-ready case: the engine skips evaluation for the tick.
pub struct Host<'a> {
    pub clock: Option<&'a mut dyn PlaybackClock>,
    pub clips: &'a dyn ClipCatalog,
    pub scene: &'a mut dyn SceneHost,
    pub callbacks: &'a mut dyn CallbackInvoker,
}

impl<'a> Host<'a> {
    pub fn new(
        clock: &'a mut dyn PlaybackClock,
        clips: &'a dyn ClipCatalog,
        scene: &'a mut dyn SceneHost,
        callbacks: &'a mut dyn CallbackInvoker,
    ) -> Self {
        Self {
            clock: Some(clock),
            clips,
            scene,
            callbacks,
        }
    }

    /// Host without a playback clock (the animator is missing).
    pub fn without_clock(
        clips: &'a dyn ClipCatalog,
        scene: &'a mut dyn SceneHost,
        callbacks: &'a mut dyn CallbackInvoker,
    ) -> Self {
        Self {
            clock: None,
            clips,
            scene,
            callbacks,
        }
    }
}
