//! In-memory scene graph implementing [`SceneHost`].
//!
//! Nodes carry a local TRS pose and an optional parent; world matrices are composed on demand.
//! Useful for headless hosts and for tests.

use hashbrown::HashMap;
use log::warn;
use nalgebra::Matrix4;

use crate::event::PrefabRef;
use crate::host::SceneHost;
use crate::ids::NodeId;
use crate::pose::Pose;

#[derive(Clone, Debug)]
struct Node {
    name: String,
    parent: Option<NodeId>,
    local: Pose,
    asset: bool,
}

/// Lifecycle changes, in order, for callers that care about sequencing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SceneOp {
    Instantiated { node: NodeId, prefab: PrefabRef },
    Destroyed { node: NodeId },
}

#[derive(Clone, Debug, Default)]
pub struct SceneGraph {
    nodes: HashMap<NodeId, Node>,
    prefabs: HashMap<PrefabRef, Pose>,
    next: u64,
    log: Vec<SceneOp>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self {
            next: 1,
            ..Self::default()
        }
    }

    fn alloc(&mut self) -> NodeId {
        if self.next == 0 {
            self.next = 1;
        }
        let id = NodeId(self.next);
        self.next += 1;
        id
    }

    /// Add a scene node (an anchor candidate).
    pub fn add_node(&mut self, name: impl Into<String>, parent: Option<NodeId>, local: Pose) -> NodeId {
        let id = self.alloc();
        let parent = parent.filter(|p| self.nodes.contains_key(p));
        self.nodes.insert(
            id,
            Node {
                name: name.into(),
                parent,
                local,
                asset: false,
            },
        );
        id
    }

    /// Add an asset handle: addressable, but not part of the live scene.
    pub fn add_asset(&mut self, name: impl Into<String>) -> NodeId {
        let id = self.alloc();
        self.nodes.insert(
            id,
            Node {
                name: name.into(),
                parent: None,
                local: Pose::IDENTITY,
                asset: true,
            },
        );
        id
    }

    /// Register an instantiable prefab with its authored world pose.
    pub fn register_prefab(&mut self, prefab: PrefabRef, pose: Pose) {
        self.prefabs.insert(prefab, pose);
    }

    pub fn name(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(&node).map(|n| n.name.as_str())
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|n| n.parent)
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        let mut out: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(_, n)| n.parent == Some(node))
            .map(|(id, _)| *id)
            .collect();
        out.sort_by_key(|n| n.0);
        out
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Instances created from prefabs that are still alive.
    pub fn live_instances(&self) -> usize {
        let mut alive = 0;
        for op in &self.log {
            match op {
                SceneOp::Instantiated { node, .. } if self.nodes.contains_key(node) => alive += 1,
                _ => {}
            }
        }
        alive
    }

    pub fn ops(&self) -> &[SceneOp] {
        &self.log
    }

    pub fn clear_ops(&mut self) {
        self.log.clear();
    }

    fn world_matrix(&self, node: NodeId) -> Option<Matrix4<f32>> {
        let mut m = self.nodes.get(&node)?.local.to_matrix();
        let mut cursor = self.nodes.get(&node)?.parent;
        let mut depth = 0usize;
        while let Some(parent) = cursor {
            let p = self.nodes.get(&parent)?;
            m = p.local.to_matrix() * m;
            cursor = p.parent;
            depth += 1;
            if depth > self.nodes.len() {
                warn!("parent cycle detected at node {:?}", node);
                return None;
            }
        }
        Some(m)
    }

    fn is_descendant(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut cursor = Some(node);
        let mut depth = 0usize;
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.nodes.get(&current).and_then(|n| n.parent);
            depth += 1;
            if depth > self.nodes.len() {
                return true;
            }
        }
        false
    }
}

impl SceneHost for SceneGraph {
    fn instantiate(&mut self, prefab: &PrefabRef) -> Option<NodeId> {
        let pose = *self.prefabs.get(prefab)?;
        let id = self.alloc();
        self.nodes.insert(
            id,
            Node {
                name: prefab.name().to_string(),
                parent: None,
                local: pose,
                asset: false,
            },
        );
        self.log.push(SceneOp::Instantiated {
            node: id,
            prefab: prefab.clone(),
        });
        Some(id)
    }

    fn destroy(&mut self, node: NodeId) {
        if !self.nodes.contains_key(&node) {
            return;
        }
        let mut doomed = vec![node];
        let mut i = 0;
        while i < doomed.len() {
            let current = doomed[i];
            doomed.extend(self.children(current));
            i += 1;
        }
        for id in doomed {
            self.nodes.remove(&id);
        }
        self.log.push(SceneOp::Destroyed { node });
    }

    fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    fn is_asset(&self, node: NodeId) -> bool {
        self.nodes.get(&node).is_some_and(|n| n.asset)
    }

    fn set_parent(&mut self, node: NodeId, parent: Option<NodeId>) {
        let Some(world) = self.world_matrix(node) else {
            return;
        };
        if let Some(p) = parent {
            if !self.nodes.contains_key(&p) || self.is_descendant(p, node) {
                warn!("refusing to parent {:?} under {:?}", node, p);
                return;
            }
        }
        let local = match parent.and_then(|p| self.world_matrix(p)) {
            Some(pm) => match pm.try_inverse() {
                Some(inv) => Pose::from_matrix(&(inv * world)),
                None => {
                    warn!("parent {:?} has a singular transform", parent);
                    return;
                }
            },
            None => Pose::from_matrix(&world),
        };
        if let Some(n) = self.nodes.get_mut(&node) {
            n.parent = parent;
            n.local = local;
        }
    }

    fn local_pose(&self, node: NodeId) -> Option<Pose> {
        self.nodes.get(&node).map(|n| n.local)
    }

    fn world_pose(&self, node: NodeId) -> Option<Pose> {
        let n = self.nodes.get(&node)?;
        if n.parent.is_none() {
            return Some(n.local);
        }
        self.world_matrix(node).map(|m| Pose::from_matrix(&m))
    }

    fn set_local_pose(&mut self, node: NodeId, pose: &Pose) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.local = *pose;
        }
    }

    fn set_world_pose(&mut self, node: NodeId, pose: &Pose) {
        let parent = match self.nodes.get(&node) {
            Some(n) => n.parent,
            None => return,
        };
        let local = match parent.and_then(|p| self.world_matrix(p)) {
            Some(pm) => match pm.try_inverse() {
                Some(inv) => Pose::from_matrix(&(inv * pose.to_matrix())),
                None => return,
            },
            None => *pose,
        };
        if let Some(n) = self.nodes.get_mut(&node) {
            n.local = local;
        }
    }

    fn local_to_world(&self, node: NodeId) -> Option<Matrix4<f32>> {
        self.world_matrix(node)
    }

    fn prefab_pose(&self, prefab: &PrefabRef) -> Option<Pose> {
        self.prefabs.get(prefab).copied()
    }
}
