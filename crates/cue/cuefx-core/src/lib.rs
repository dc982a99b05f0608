//! Cue Engine Core
//!
//! Frame-accurate spawn and callback cues for animation clips. Events fire exactly once when
//! playback crosses their trigger frame, re-arm when playback goes back, spawn at most one
//! instance each, and can be anchored to scene nodes with their pose kept in the anchor's
//! frame. Host engines plug in through the traits in [`host`] and [`clock`].

pub mod callbacks;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod frame;
pub mod host;
pub mod ids;
pub mod modes;
pub mod outputs;
pub mod persistence;
pub mod pose;
pub mod scene;
pub mod space;
pub mod spawn;
pub mod trigger;

// Re-export common types for convenience
pub use callbacks::CallbackRegistry;
pub use clock::{ClipCatalog, ClipInfo, ClipLibrary, ManualClock, PlaybackClock};
pub use config::Config;
pub use engine::{Engine, MoveDirection};
pub use error::CueError;
pub use event::{CallbackSet, EventBundle, Payload, PayloadKind, PrefabRef};
pub use frame::{FrameSample, FrameTracker};
pub use host::{CallbackInvoker, Host, NoCallbacks, SceneHost};
pub use ids::{ClipId, EngineId, EventId, NodeId, SessionId};
pub use modes::ModeRegistry;
pub use outputs::{Outputs, TickEvent};
pub use persistence::{restore_all, save_all, FileStore, MemoryStore, Snapshot, SnapshotStore};
pub use pose::Pose;
pub use scene::{SceneGraph, SceneOp};
pub use space::PosePolicy;
pub use trigger::{Transition, TriggerState};

/// Cue engine result type
pub type Result<T> = core::result::Result<T, CueError>;
