//! Error types for the cue engine.
//!
//! Only rejected authoring edits, bad configuration and storage failures are errors. Not-ready
//! clocks, clamped frames, missing payloads and absent snapshots degrade to no-ops instead.

use serde::{Deserialize, Serialize};

use crate::ids::{EventId, NodeId};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum CueError {
    /// Anchor points at a spawned instance owned by an event.
    #[error("Anchor {anchor:?} is the live instance of event {owner}")]
    AnchorIsLiveInstance { anchor: NodeId, owner: EventId },

    /// Anchor points at an asset rather than a scene node.
    #[error("Anchor {anchor:?} is an asset, not a scene node")]
    AnchorIsAsset { anchor: NodeId },

    /// Anchor does not exist in the host scene.
    #[error("Anchor {anchor:?} does not exist in the scene")]
    UnknownAnchor { anchor: NodeId },

    #[error("Event not found: {id}")]
    EventNotFound { id: EventId },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Storage error: {reason}")]
    Storage { reason: String },

    #[error("Serialization error: {reason}")]
    Serialization { reason: String },
}

impl CueError {
    /// True for authoring edits the engine refused (state left unchanged).
    #[inline]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::AnchorIsLiveInstance { .. } | Self::AnchorIsAsset { .. } | Self::UnknownAnchor { .. }
        )
    }

    /// Error category for logging.
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::AnchorIsLiveInstance { .. }
            | Self::AnchorIsAsset { .. }
            | Self::UnknownAnchor { .. } => "validation",
            Self::EventNotFound { .. } => "data",
            Self::InvalidConfig { .. } => "config",
            Self::Storage { .. } => "io",
            Self::Serialization { .. } => "serialization",
        }
    }
}

impl From<std::io::Error> for CueError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage {
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for CueError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}
