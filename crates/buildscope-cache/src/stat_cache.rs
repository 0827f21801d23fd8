//! Result caches keyed by filter signature.
//!
//! Three independent stores share one signature function:
//! - top-level: snapshot-only and item-only results, bounded
//! - combinations: fully filtered results and pooled aggregates
//! - singles: one result per basetype, reused across aggregations

use buildscope_core::config::EngineSettings;
use buildscope_core::filter::FilterState;
use buildscope_stats::dimension::{classify, DimensionKind};
use buildscope_stats::{BasetypeAggregate, ResolvedResult};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::bounded::BoundedCache;

#[derive(Debug, Clone, PartialEq)]
pub enum CacheEntry {
    Raw(Arc<ResolvedResult>),
    Aggregate(Arc<BasetypeAggregate>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    Stored,
    /// Returned to the caller but not kept.
    Insufficient,
}

/// Split of requested basetypes into cache hits and the ones still to fetch.
#[derive(Debug, Clone, Default)]
pub struct Partition {
    pub cached: Vec<(String, Arc<ResolvedResult>)>,
    pub uncached: Vec<String>,
}

impl Partition {
    pub fn is_complete(&self) -> bool {
        self.uncached.is_empty()
    }
}

/// An item-only query whose basetype, modifier and skill breakdowns are all
/// empty carries nothing worth keeping. Any extra filter makes the query
/// specific enough to trust an empty answer.
pub fn is_insufficient(state: &FilterState, result: &ResolvedResult, control_dimension: &str) -> bool {
    if !state.is_item_only() {
        return false;
    }
    !result.result.dimensions.iter().any(|d| {
        let relevant = matches!(
            classify(&d.id, control_dimension),
            DimensionKind::Basetypes(_) | DimensionKind::Modifiers | DimensionKind::Skills
        );
        relevant && !d.counts.is_empty()
    })
}

fn is_top_level(state: &FilterState) -> bool {
    state.basetypes.is_empty() && state.modifiers.is_empty() && state.skills.is_empty()
}

pub struct StatCache {
    control_dimension: String,
    top_level: BoundedCache<CacheEntry>,
    combinations: HashMap<String, CacheEntry>,
    singles: HashMap<String, Arc<ResolvedResult>>,
}

impl StatCache {
    pub fn new(settings: &EngineSettings) -> Self {
        Self {
            control_dimension: settings.control_dimension.clone(),
            top_level: BoundedCache::new(settings.top_level_capacity),
            combinations: HashMap::new(),
            singles: HashMap::new(),
        }
    }

    pub fn get_combination(&self, state: &FilterState) -> Option<&CacheEntry> {
        let sig = state.signature();
        let hit = if is_top_level(state) { self.top_level.get(&sig) } else { self.combinations.get(&sig) };
        debug!(signature = %sig, hit = hit.is_some(), "combination lookup");
        hit
    }

    pub fn put_combination(&mut self, state: &FilterState, entry: CacheEntry) -> StoreOutcome {
        if let CacheEntry::Raw(result) = &entry {
            if is_insufficient(state, result, &self.control_dimension) {
                warn!(signature = %state.signature(), "insufficient data, not caching");
                return StoreOutcome::Insufficient;
            }
        }
        let sig = state.signature();
        if is_top_level(state) {
            if let Some(evicted) = self.top_level.insert(sig, entry) {
                debug!(evicted = %evicted, "top-level cache full, evicted oldest");
            }
        } else {
            self.combinations.insert(sig, entry);
        }
        StoreOutcome::Stored
    }

    pub fn get_single(&self, state: &FilterState, basetype: &str) -> Option<Arc<ResolvedResult>> {
        self.singles.get(&state.for_basetype(basetype).signature()).cloned()
    }

    pub fn has_single(&self, state: &FilterState, basetype: &str) -> bool {
        self.singles.contains_key(&state.for_basetype(basetype).signature())
    }

    pub fn put_single(&mut self, state: &FilterState, basetype: &str, result: Arc<ResolvedResult>) {
        self.singles.insert(state.for_basetype(basetype).signature(), result);
    }

    /// Which of `basetypes` already have a single-basetype result under the
    /// other filters of `state`. Order of `basetypes` is preserved.
    pub fn partition(&self, state: &FilterState, basetypes: &[String]) -> Partition {
        let mut out = Partition::default();
        for bt in basetypes {
            match self.get_single(state, bt) {
                Some(result) => out.cached.push((bt.clone(), result)),
                None => out.uncached.push(bt.clone()),
            }
        }
        debug!(cached = out.cached.len(), uncached = out.uncached.len(), "partitioned basetypes");
        out
    }

    pub fn len(&self) -> usize {
        self.top_level.len() + self.combinations.len() + self.singles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.top_level.clear();
        self.combinations.clear();
        self.singles.clear();
    }
}
