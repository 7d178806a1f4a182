//! Durable mirror of the working copy
//!
//! The whole serialized document lives in a single slot. Writes are best effort:
//! the backend holds the authoritative copy, the mirror only survives restarts
//! within a session.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use sb_core::error::{SbError, SbResult};
use tracing::debug;

/// Single-slot storage for the serialized working copy
pub trait Mirror: Send + Sync {
    /// Read the slot, `None` when nothing has been written yet
    fn load(&self) -> SbResult<Option<String>>;

    /// Overwrite the slot
    fn save(&self, contents: &str) -> SbResult<()>;

    /// Empty the slot
    fn clear(&self) -> SbResult<()>;

    /// Short name for log lines
    fn name(&self) -> &'static str;
}

/// Mirror backed by one JSON file on disk
#[derive(Debug, Clone)]
pub struct FileMirror {
    path: PathBuf,
}

impl FileMirror {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        PathBuf::from(staging)
    }
}

impl Mirror for FileMirror {
    fn load(&self) -> SbResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(None),
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SbError::Mirror(format!("{}: {}", self.path.display(), e))),
        }
    }

    fn save(&self, contents: &str) -> SbResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Write aside and rename so a crash never leaves a half-written slot
        let staging = self.staging_path();
        fs::write(&staging, contents)?;
        fs::rename(&staging, &self.path)?;

        debug!(path = %self.path.display(), bytes = contents.len(), "Mirror written");
        Ok(())
    }

    fn clear(&self) -> SbResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

/// In-process mirror, shareable between a store and a test that inspects it
#[derive(Debug, Clone, Default)]
pub struct MemoryMirror {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current slot contents
    pub fn contents(&self) -> Option<String> {
        self.slot.lock().clone()
    }
}

impl Mirror for MemoryMirror {
    fn load(&self) -> SbResult<Option<String>> {
        Ok(self.slot.lock().clone())
    }

    fn save(&self, contents: &str) -> SbResult<()> {
        *self.slot.lock() = Some(contents.to_string());
        Ok(())
    }

    fn clear(&self) -> SbResult<()> {
        *self.slot.lock() = None;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Mirror that keeps nothing (mirroring disabled)
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMirror;

impl Mirror for NullMirror {
    fn load(&self) -> SbResult<Option<String>> {
        Ok(None)
    }

    fn save(&self, _contents: &str) -> SbResult<()> {
        Ok(())
    }

    fn clear(&self) -> SbResult<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "null"
    }
}
