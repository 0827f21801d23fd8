//! File-backed collaborators: fixture transport and JSON preference file.

use anyhow::Context;
use buildscope_core::filter::FetchIntent;
use buildscope_core::traits::{FetchTransport, PreferenceStore};
use buildscope_core::types::{DictionarySource, PreferenceKey};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Serves payloads from `<root>/results/<digest>.bin` and
/// `<root>/dictionaries/<hash>.bin`.
pub struct FsTransport {
    root: PathBuf,
}

impl FsTransport {
    pub fn new(root: &Path) -> Self {
        Self { root: root.to_path_buf() }
    }

    pub fn path_for(&self, intent: &FetchIntent) -> PathBuf {
        let dir = match intent {
            FetchIntent::Search { .. } => "results",
            FetchIntent::Dictionary { .. } => "dictionaries",
        };
        self.root.join(dir).join(format!("{}.bin", intent.digest()))
    }

    /// Store a payload where a later fetch of `intent` will find it.
    pub fn write(&self, intent: &FetchIntent, bytes: &[u8]) -> anyhow::Result<PathBuf> {
        let path = self.path_for(intent);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }
}

impl FetchTransport for FsTransport {
    fn fetch(&self, intent: &FetchIntent) -> anyhow::Result<Vec<u8>> {
        let path = self.path_for(intent);
        fs::read(&path).with_context(|| format!("no fixture for {} at {}", intent.label(), path.display()))
    }

    fn source(&self) -> DictionarySource {
        DictionarySource::Fixture
    }
}

/// Preferences persisted as one JSON object of `storage_key -> members`.
pub struct JsonPreferenceStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonPreferenceStore {
    pub fn new(path: &Path) -> Self {
        Self { path: path.to_path_buf(), lock: Mutex::new(()) }
    }

    fn read_all(&self) -> anyhow::Result<BTreeMap<String, Vec<String>>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = fs::read_to_string(&self.path).with_context(|| format!("reading {}", self.path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", self.path.display()))
    }
}

impl PreferenceStore for JsonPreferenceStore {
    fn get(&self, key: &PreferenceKey) -> anyhow::Result<Option<Vec<String>>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_all()?.remove(&key.storage_key()))
    }

    fn set(&self, key: &PreferenceKey, members: &[String]) -> anyhow::Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut all = self.read_all()?;
        all.insert(key.storage_key(), members.to_vec());
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&all)?).with_context(|| format!("writing {}", self.path.display()))
    }
}
