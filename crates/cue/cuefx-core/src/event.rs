//! Event records ("bundles"): what to spawn or call, on which clip, at which frame, and where.

use serde::{Deserialize, Serialize};

use crate::ids::{ClipId, EventId, NodeId};
use crate::pose::Pose;
use crate::trigger::TriggerState;

/// Reference to an instantiable asset known to the scene host.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct PrefabRef(pub String);

impl PrefabRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// Zero-argument callbacks, addressed by name.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallbackSet(pub Vec<String>);

impl CallbackSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Which payload side the authoring surface presents.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum PayloadKind {
    #[default]
    Prefab,
    Callbacks,
}

/// Both payload sides are stored; `presented` only drives display.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    #[serde(default)]
    pub prefab: Option<PrefabRef>,
    #[serde(default)]
    pub callbacks: CallbackSet,
    #[serde(default)]
    pub presented: PayloadKind,
}

/// One event bound to a clip frame.
///
/// Persisted fields are read through accessors and changed through the engine, which keeps the
/// trigger frame clamped and routes anchor changes through the space converter. `state` and
/// `live` are transient and never serialized.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventBundle {
    pub(crate) id: EventId,
    #[serde(default)]
    pub(crate) name: String,
    pub(crate) enabled: bool,
    #[serde(default)]
    pub(crate) clip: Option<ClipId>,
    #[serde(default)]
    pub(crate) trigger_frame: u32,
    #[serde(default)]
    pub(crate) anchor: Option<NodeId>,
    pub(crate) keep_anchor_relative: bool,
    #[serde(default)]
    pub(crate) pose: Pose,
    #[serde(default)]
    pub(crate) payload: Payload,

    #[serde(skip)]
    pub(crate) state: TriggerState,
    #[serde(skip)]
    pub(crate) live: Option<NodeId>,
}

impl EventBundle {
    pub fn new(id: EventId, clip: Option<ClipId>) -> Self {
        Self {
            id,
            name: String::new(),
            enabled: true,
            clip,
            trigger_frame: 0,
            anchor: None,
            keep_anchor_relative: true,
            pose: Pose::IDENTITY,
            payload: Payload::default(),
            state: TriggerState::Armed,
            live: None,
        }
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name for display: the stored name, or `Event <index>` when blank.
    pub fn display_name(&self, index: usize) -> String {
        if self.name.trim().is_empty() {
            format!("Event {index}")
        } else {
            self.name.clone()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn clip(&self) -> Option<&ClipId> {
        self.clip.as_ref()
    }

    pub fn trigger_frame(&self) -> u32 {
        self.trigger_frame
    }

    pub fn anchor(&self) -> Option<NodeId> {
        self.anchor
    }

    pub fn keep_anchor_relative(&self) -> bool {
        self.keep_anchor_relative
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn state(&self) -> TriggerState {
        self.state
    }

    pub fn is_fired(&self) -> bool {
        self.state.is_fired()
    }

    /// Handle of the currently spawned instance, if any.
    pub fn live_instance(&self) -> Option<NodeId> {
        self.live
    }

    /// Neither a prefab nor a callback: firing would do nothing.
    pub fn is_empty(&self) -> bool {
        self.payload.prefab.is_none() && self.payload.callbacks.is_empty()
    }

    /// Persisted fields only, for comparing records across a save / restore.
    pub fn same_persisted_fields(&self, other: &EventBundle) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.enabled == other.enabled
            && self.clip == other.clip
            && self.trigger_frame == other.trigger_frame
            && self.anchor == other.anchor
            && self.keep_anchor_relative == other.keep_anchor_relative
            && self.pose == other.pose
            && self.payload == other.payload
    }
}
