//! Hash-keyed dictionary sharing. The store only holds weak references, so a
//! dictionary stays alive exactly as long as some cached result points at it.

use buildscope_core::types::Dictionary;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tracing::debug;

#[derive(Debug, Default)]
pub struct DictionaryStore {
    entries: Mutex<HashMap<String, Weak<Dictionary>>>,
}

impl DictionaryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, hash: &str) -> Option<Arc<Dictionary>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(hash).and_then(Weak::upgrade)
    }

    pub fn insert(&self, hash: &str, dictionary: Dictionary) -> Arc<Dictionary> {
        let dictionary = Arc::new(dictionary);
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(hash.to_string(), Arc::downgrade(&dictionary));
        dictionary
    }

    /// Shared instance for `hash`, loading it when no live copy exists.
    pub fn get_or_load<F>(&self, hash: &str, load: F) -> anyhow::Result<Arc<Dictionary>>
    where
        F: FnOnce() -> anyhow::Result<Dictionary>,
    {
        if let Some(dict) = self.get(hash) {
            debug!(hash, "dictionary reused");
            return Ok(dict);
        }
        let dict = load()?;
        // Another loader may have won the race while we were fetching.
        if let Some(existing) = self.get(hash) {
            return Ok(existing);
        }
        Ok(self.insert(hash, dict))
    }

    /// Drop entries whose dictionaries are no longer referenced.
    pub fn prune(&self) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, w| w.strong_count() > 0);
        before - entries.len()
    }

    pub fn live_count(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.values().filter(|w| w.strong_count() > 0).count()
    }
}
