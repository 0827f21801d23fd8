//! In-process collaborators: a scripted transport and a map-backed
//! preference store. Used by tests and by embedders that prefetch payloads.

use anyhow::{anyhow, bail};
use buildscope_core::filter::{FetchIntent, FilterState};
use buildscope_core::traits::{FetchTransport, PreferenceStore};
use buildscope_core::types::{Dictionary, PreferenceKey, SearchResult};
use buildscope_wire::{encode_dictionary, encode_envelope};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Default)]
pub struct MemoryTransport {
    responses: Mutex<HashMap<FetchIntent, Vec<u8>>>,
    failures: Mutex<HashSet<FetchIntent>>,
    calls: AtomicUsize,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, intent: FetchIntent, bytes: Vec<u8>) {
        self.responses.lock().unwrap_or_else(PoisonError::into_inner).insert(intent, bytes);
    }

    /// Register the encoded envelope answering `state`.
    pub fn insert_result(&self, state: &FilterState, result: &SearchResult) {
        self.insert(state.fetch_intent(), encode_envelope(result));
    }

    pub fn insert_dictionary(&self, hash: &str, dictionary: &Dictionary) {
        self.insert(FetchIntent::Dictionary { hash: hash.to_string() }, encode_dictionary(dictionary));
    }

    /// Make every later fetch of `intent` fail.
    pub fn fail(&self, intent: FetchIntent) {
        self.failures.lock().unwrap_or_else(PoisonError::into_inner).insert(intent);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FetchTransport for MemoryTransport {
    fn fetch(&self, intent: &FetchIntent) -> anyhow::Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failures.lock().unwrap_or_else(PoisonError::into_inner).contains(intent) {
            bail!("request failed: {}", intent.path());
        }
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(intent)
            .cloned()
            .ok_or_else(|| anyhow!("no response for {}", intent.path()))
    }
}

#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    entries: Mutex<HashMap<String, Vec<String>>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &PreferenceKey) -> anyhow::Result<Option<Vec<String>>> {
        Ok(self.entries.lock().unwrap_or_else(PoisonError::into_inner).get(&key.storage_key()).cloned())
    }

    fn set(&self, key: &PreferenceKey, members: &[String]) -> anyhow::Result<()> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).insert(key.storage_key(), members.to_vec());
        Ok(())
    }
}
