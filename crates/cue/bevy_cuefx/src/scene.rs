//! `SceneHost` over a Bevy `World`.
//!
//! Nodes are entities (`NodeId` carries `Entity::to_bits`). Poses map onto `Transform`, with
//! Euler angles in degrees applied Z, X, then Y (`EulerRot::YXZ` in glam terms). World
//! matrices are composed from `Transform`s along the `Parent` chain, so results do not depend
//! on `GlobalTransform` propagation having run yet.

use bevy::log::warn;
use bevy::prelude::*;
use cuefx_core::{EngineId, NodeId, Pose, PrefabRef, SceneHost};
use nalgebra::Matrix4;

use crate::components::{CueAsset, CueInstance};
use crate::resources::PrefabLibrary;

pub fn entity_to_node(entity: Entity) -> NodeId {
    NodeId(entity.to_bits())
}

pub fn node_to_entity(node: NodeId) -> Option<Entity> {
    Entity::try_from_bits(node.0).ok()
}

pub fn pose_to_transform(pose: &Pose) -> Transform {
    let [x, y, z] = pose.rotation.map(f32::to_radians);
    Transform {
        translation: Vec3::from_array(pose.position),
        rotation: Quat::from_euler(EulerRot::YXZ, y, x, z),
        scale: Vec3::from_array(pose.scale),
    }
}

pub fn transform_to_pose(transform: &Transform) -> Pose {
    let (y, x, z) = transform.rotation.to_euler(EulerRot::YXZ);
    Pose::new(
        transform.translation.to_array(),
        [x.to_degrees(), y.to_degrees(), z.to_degrees()],
        transform.scale.to_array(),
    )
}

fn to_nalgebra(m: &Mat4) -> Matrix4<f32> {
    Matrix4::from_column_slice(&m.to_cols_array())
}

/// Borrowed world, seen through the engine's scene port.
pub struct WorldScene<'w> {
    world: &'w mut World,
    engine: EngineId,
}

impl<'w> WorldScene<'w> {
    pub fn new(world: &'w mut World, engine: EngineId) -> Self {
        Self { world, engine }
    }

    fn entity(&self, node: NodeId) -> Option<Entity> {
        node_to_entity(node).filter(|e| self.world.get_entity(*e).is_some())
    }

    fn parent_of(&self, entity: Entity) -> Option<Entity> {
        self.world.get::<Parent>(entity).map(|p| p.get())
    }

    fn world_matrix(&self, entity: Entity) -> Option<Mat4> {
        let mut m = self.world.get::<Transform>(entity)?.compute_matrix();
        let mut cursor = self.parent_of(entity);
        while let Some(parent) = cursor {
            let t = self.world.get::<Transform>(parent).copied().unwrap_or_default();
            m = t.compute_matrix() * m;
            cursor = self.parent_of(parent);
        }
        Some(m)
    }

    fn is_ancestor_or_self(&self, ancestor: Entity, entity: Entity) -> bool {
        let mut cursor = Some(entity);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent_of(current);
        }
        false
    }
}

impl SceneHost for WorldScene<'_> {
    fn instantiate(&mut self, prefab: &PrefabRef) -> Option<NodeId> {
        let template = self
            .world
            .get_resource::<PrefabLibrary>()
            .and_then(|lib| lib.get(prefab))
            .cloned()?;
        let entity = self
            .world
            .spawn((
                SpatialBundle::from_transform(template.transform),
                Name::new(prefab.name().to_string()),
                CueInstance {
                    engine: self.engine,
                    prefab: prefab.clone(),
                },
            ))
            .id();
        Some(entity_to_node(entity))
    }

    fn destroy(&mut self, node: NodeId) {
        if let Some(entity) = self.entity(node) {
            if let Some(e) = self.world.get_entity_mut(entity) {
                e.despawn_recursive();
            }
        }
    }

    fn contains(&self, node: NodeId) -> bool {
        self.entity(node).is_some()
    }

    fn is_asset(&self, node: NodeId) -> bool {
        self.entity(node)
            .is_some_and(|e| self.world.get::<CueAsset>(e).is_some())
    }

    fn set_parent(&mut self, node: NodeId, parent: Option<NodeId>) {
        let Some(entity) = self.entity(node) else {
            return;
        };
        let Some(world_m) = self.world_matrix(entity) else {
            return;
        };
        let parent = match parent {
            Some(p) => match self.entity(p) {
                Some(pe) if !self.is_ancestor_or_self(entity, pe) => Some(pe),
                _ => {
                    warn!("refusing to parent {entity:?} under {p:?}");
                    return;
                }
            },
            None => None,
        };

        let local = match parent.and_then(|p| self.world_matrix(p)) {
            Some(pm) if pm.determinant().abs() > f32::EPSILON => pm.inverse() * world_m,
            Some(_) => {
                warn!("parent of {entity:?} has a singular transform");
                return;
            }
            None => world_m,
        };
        let mut e = self.world.entity_mut(entity);
        match parent {
            Some(p) => e.set_parent(p),
            None => e.remove_parent(),
        };
        e.insert(Transform::from_matrix(local));
    }

    fn local_pose(&self, node: NodeId) -> Option<Pose> {
        let entity = self.entity(node)?;
        self.world.get::<Transform>(entity).map(transform_to_pose)
    }

    fn world_pose(&self, node: NodeId) -> Option<Pose> {
        let entity = self.entity(node)?;
        let m = self.world_matrix(entity)?;
        Some(transform_to_pose(&Transform::from_matrix(m)))
    }

    fn set_local_pose(&mut self, node: NodeId, pose: &Pose) {
        if let Some(entity) = self.entity(node) {
            self.world.entity_mut(entity).insert(pose_to_transform(pose));
        }
    }

    fn set_world_pose(&mut self, node: NodeId, pose: &Pose) {
        let Some(entity) = self.entity(node) else {
            return;
        };
        let target = pose_to_transform(pose).compute_matrix();
        let local = match self.parent_of(entity).and_then(|p| self.world_matrix(p)) {
            Some(pm) if pm.determinant().abs() > f32::EPSILON => {
                Transform::from_matrix(pm.inverse() * target)
            }
            Some(_) => return,
            None => pose_to_transform(pose),
        };
        self.world.entity_mut(entity).insert(local);
    }

    fn local_to_world(&self, node: NodeId) -> Option<Matrix4<f32>> {
        let entity = self.entity(node)?;
        self.world_matrix(entity).map(|m| to_nalgebra(&m))
    }

    fn prefab_pose(&self, prefab: &PrefabRef) -> Option<Pose> {
        self.world
            .get_resource::<PrefabLibrary>()
            .and_then(|lib| lib.get(prefab))
            .map(|t| transform_to_pose(&t.transform))
    }
}
