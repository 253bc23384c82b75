// src/fs/mock.rs

use super::{normalize_lexically, FileSystem};
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockKind {
    File,
    Dir,
}

#[derive(Debug, Clone, Copy)]
pub struct MockEntry {
    pub kind: MockKind,
    pub device: u64,
}

/// In-memory filesystem where each entry declares the volume it lives on.
///
/// Lets tests describe "two directories on distinct volumes" without
/// real mounts.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    entries: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_dir(&self, path: impl AsRef<Path>, device: u64) -> &Self {
        self.insert(path.as_ref(), MockKind::Dir, device);
        self
    }

    pub fn add_file(&self, path: impl AsRef<Path>, device: u64) -> &Self {
        self.insert(path.as_ref(), MockKind::File, device);
        self
    }

    fn insert(&self, path: &Path, kind: MockKind, device: u64) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(normalize_lexically(path), MockEntry { kind, device });
    }

    fn get(&self, path: &Path) -> Option<MockEntry> {
        let entries = self.entries.lock().unwrap();
        entries.get(&normalize_lexically(path)).copied()
    }
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.get(path).is_some()
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(self.get(path), Some(e) if e.kind == MockKind::File)
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.get(path), Some(e) if e.kind == MockKind::Dir)
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        // Mock paths are assumed absolute; only lexical cleanup applies.
        match self.get(path) {
            Some(_) => Ok(normalize_lexically(path)),
            None => Err(anyhow!("No such file or directory: {:?}", path)),
        }
    }

    fn device_id(&self, path: &Path) -> Result<u64> {
        self.get(path)
            .map(|e| e.device)
            .ok_or_else(|| anyhow!("No such file or directory: {:?}", path))
    }
}
