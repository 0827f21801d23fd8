//! Key to label resolution, and a decoded result bundled with the
//! dictionaries its dimensions point at.

use buildscope_core::types::{Dictionary, Dimension, SearchResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::dimension::{process_dimension, true_total, ProcessedDimension};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedLabel {
    pub name: String,
    pub resolved: bool,
}

pub fn placeholder(key: u64) -> String {
    format!("Key_{key}")
}

/// Label for `key`; never fails. Missing dictionaries, out-of-range keys and
/// empty labels all degrade to a placeholder with `resolved = false`.
pub fn resolve(key: u64, dictionary: Option<&Dictionary>) -> ResolvedLabel {
    match dictionary.and_then(|d| d.label(key)) {
        Some(name) => ResolvedLabel { name: name.to_string(), resolved: true },
        None => ResolvedLabel { name: placeholder(key), resolved: false },
    }
}

/// A decoded result together with its loaded dictionaries (keyed by
/// dictionary id) and its normalization denominator.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedResult {
    pub result: SearchResult,
    pub dictionaries: HashMap<String, Arc<Dictionary>>,
    pub true_total: u64,
}

impl ResolvedResult {
    pub fn new(result: SearchResult, dictionaries: HashMap<String, Arc<Dictionary>>, control_dimension: &str) -> Self {
        let true_total = true_total(&result, control_dimension);
        Self { result, dictionaries, true_total }
    }

    pub fn dictionary_for(&self, dimension: &Dimension) -> Option<&Dictionary> {
        self.dictionaries.get(&dimension.dictionary_id).map(AsRef::as_ref)
    }

    pub fn label(&self, dimension: &Dimension, key: u64) -> ResolvedLabel {
        resolve(key, self.dictionary_for(dimension))
    }

    /// Dictionary ids referenced by dimensions but not loaded.
    pub fn missing_dictionaries(&self) -> Vec<String> {
        let mut missing: Vec<String> = self
            .result
            .dimensions
            .iter()
            .filter(|d| !self.dictionaries.contains_key(&d.dictionary_id))
            .map(|d| d.dictionary_id.clone())
            .collect();
        missing.sort();
        missing.dedup();
        missing
    }

    pub fn process(&self, dimension: &Dimension) -> ProcessedDimension {
        process_dimension(dimension, self.dictionary_for(dimension), self.true_total)
    }

    pub fn process_all(&self) -> Vec<ProcessedDimension> {
        self.result.dimensions.iter().map(|d| self.process(d)).collect()
    }
}
