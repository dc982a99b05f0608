//! Snapshot persistence across authoring / play transitions.
//!
//! Before the host drops its engines, every engine writes a JSON snapshot keyed by its
//! `EngineId`. After the transition each engine reads its record back, overwrites its event
//! list, and deletes the record. A missing record is not an error.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use hashbrown::HashMap;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::engine::Engine;
use crate::event::EventBundle;
use crate::ids::EngineId;
use crate::Result;

pub const SNAPSHOT_VERSION: u32 = 1;

fn default_version() -> u32 {
    SNAPSHOT_VERSION
}

/// Persisted engine state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub authoring: bool,
    pub play_rate: f32,
    pub edit_rate: f32,
    #[serde(default)]
    pub events: Vec<EventBundle>,
}

impl Snapshot {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Keyed blob storage for snapshots.
pub trait SnapshotStore {
    fn write(&mut self, key: EngineId, blob: &[u8]) -> Result<()>;

    /// `Ok(None)` when there is no record for `key`.
    fn read(&self, key: EngineId) -> Result<Option<Vec<u8>>>;

    /// Deleting a missing record succeeds.
    fn delete(&mut self, key: EngineId) -> Result<()>;
}

/// One file per engine: `<root>/<engine id>.<extension>`.
#[derive(Clone, Debug)]
pub struct FileStore {
    root: PathBuf,
    extension: String,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
        }
    }

    /// Store under `root` using the configured snapshot extension.
    pub fn from_config(root: impl Into<PathBuf>, cfg: &Config) -> Self {
        Self::new(root, cfg.snapshot_extension.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: EngineId) -> PathBuf {
        self.root.join(format!("{}.{}", key, self.extension))
    }
}

impl SnapshotStore for FileStore {
    fn write(&mut self, key: EngineId, blob: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        fs::write(self.path_for(key), blob)?;
        Ok(())
    }

    fn read(&self, key: EngineId) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&mut self, key: EngineId) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-local store.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    blobs: HashMap<EngineId, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    pub fn contains(&self, key: EngineId) -> bool {
        self.blobs.contains_key(&key)
    }
}

impl SnapshotStore for MemoryStore {
    fn write(&mut self, key: EngineId, blob: &[u8]) -> Result<()> {
        self.blobs.insert(key, blob.to_vec());
        Ok(())
    }

    fn read(&self, key: EngineId) -> Result<Option<Vec<u8>>> {
        Ok(self.blobs.get(&key).cloned())
    }

    fn delete(&mut self, key: EngineId) -> Result<()> {
        self.blobs.remove(&key);
        Ok(())
    }
}

/// Save every engine. Returns how many snapshots were written.
pub fn save_all<'a, I>(engines: I, store: &mut dyn SnapshotStore) -> Result<usize>
where
    I: IntoIterator<Item = &'a Engine>,
{
    let mut written = 0;
    for engine in engines {
        engine.save_state(store)?;
        written += 1;
    }
    info!("saved {written} cue engine snapshot(s)");
    Ok(written)
}

/// Restore every engine that has a record. Returns how many were restored.
pub fn restore_all<'a, I>(engines: I, store: &mut dyn SnapshotStore) -> Result<usize>
where
    I: IntoIterator<Item = &'a mut Engine>,
{
    let mut restored = 0;
    for engine in engines {
        if engine.restore_state(store)? {
            restored += 1;
        } else {
            debug!("no snapshot for engine {}", engine.id());
        }
    }
    info!("restored {restored} cue engine snapshot(s)");
    Ok(restored)
}
