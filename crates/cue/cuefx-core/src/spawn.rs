//! Spawn manager: at most one live instance per event.
//!
//! Placement rules for a fired instance:
//! - anchored and relative: parented under the anchor, stored pose applied as local pose;
//! - anchored, not relative: placed at `localToWorld(anchor) * pose` and left unparented;
//! - no anchor: stored pose applied as world pose.

use log::{debug, warn};

use crate::event::EventBundle;
use crate::host::SceneHost;
use crate::ids::NodeId;
use crate::pose::Pose;
use crate::space::{convert_pose, transform_pose, PosePolicy};

/// What a call to [`fire`] did in the scene.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SpawnOutcome {
    pub destroyed: Option<NodeId>,
    pub spawned: Option<NodeId>,
}

/// Anchor that still exists in the scene. A vanished anchor counts as none.
fn live_anchor(event: &EventBundle, scene: &dyn SceneHost) -> Option<NodeId> {
    let anchor = event.anchor?;
    if scene.contains(anchor) {
        Some(anchor)
    } else {
        warn!(
            "anchor {:?} of event {} no longer exists; placing in world space",
            anchor, event.id
        );
        None
    }
}

/// Replace the event's instance with a fresh one.
///
/// The old instance is always destroyed first. Without a prefab nothing new is created;
/// an instantiation failure is logged and leaves the event with no instance.
pub fn fire(event: &mut EventBundle, scene: &mut dyn SceneHost, policy: PosePolicy) -> SpawnOutcome {
    let destroyed = destroy(event, scene);

    let Some(prefab) = event.payload.prefab.clone() else {
        return SpawnOutcome {
            destroyed,
            spawned: None,
        };
    };

    let Some(instance) = scene.instantiate(&prefab) else {
        warn!(
            "event {}: could not instantiate prefab '{}'",
            event.id,
            prefab.name()
        );
        return SpawnOutcome {
            destroyed,
            spawned: None,
        };
    };

    let anchor = live_anchor(event, scene);
    if let (Some(anchor), true) = (anchor, event.keep_anchor_relative) {
        scene.set_parent(instance, Some(anchor));
    }
    event.live = Some(instance);
    place(event, scene, policy);
    debug!("event {} spawned {:?}", event.id, instance);

    SpawnOutcome {
        destroyed,
        spawned: Some(instance),
    }
}

/// Push the stored pose onto the live instance, without reparenting it.
pub fn place(event: &EventBundle, scene: &mut dyn SceneHost, policy: PosePolicy) {
    let Some(instance) = event.live else {
        return;
    };
    match live_anchor(event, scene) {
        Some(_) if event.keep_anchor_relative => scene.set_local_pose(instance, &event.pose),
        Some(anchor) => {
            let world = match scene.local_to_world(anchor) {
                Some(m) => transform_pose(&m, &event.pose, policy),
                None => event.pose,
            };
            scene.set_world_pose(instance, &world);
        }
        None => scene.set_world_pose(instance, &event.pose),
    }
}

/// Destroy the live instance, if any, and clear the handle.
pub fn destroy(event: &mut EventBundle, scene: &mut dyn SceneHost) -> Option<NodeId> {
    let instance = event.live.take()?;
    if scene.contains(instance) {
        scene.destroy(instance);
        debug!("event {} destroyed {:?}", event.id, instance);
    }
    Some(instance)
}

/// Destroy every event's instance; returns how many handles were cleared.
pub fn destroy_all(events: &mut [EventBundle], scene: &mut dyn SceneHost) -> usize {
    events
        .iter_mut()
        .filter_map(|e| destroy(e, scene))
        .count()
}

/// Read the instance's placement back into the event's storage frame.
///
/// Attached instances report their local pose. Detached ones report their world pose,
/// converted into the anchor frame when an anchor is set.
pub fn read_back(event: &EventBundle, scene: &dyn SceneHost, policy: PosePolicy) -> Option<Pose> {
    let instance = event.live.filter(|i| scene.contains(*i))?;
    let anchor = event.anchor.filter(|a| scene.contains(*a));
    match anchor {
        Some(_) if event.keep_anchor_relative => scene.local_pose(instance),
        Some(a) => {
            let world = scene.world_pose(instance)?;
            let to = scene.local_to_world(a);
            Some(convert_pose(&world, None, to.as_ref(), policy))
        }
        None => scene.world_pose(instance),
    }
}
