use std::collections::HashMap;
use std::sync::Arc;

use buildscope_cache::{is_insufficient, CacheEntry, DictionaryStore, StatCache, StoreOutcome};
use buildscope_core::config::EngineSettings;
use buildscope_core::filter::FilterState;
use buildscope_core::types::{Dictionary, Dimension, DimensionCount, SearchResult};
use buildscope_stats::{BasetypeAggregate, ResolvedResult};

const CONTROL: &str = "secondascendancy";

fn result_with(dims: Vec<Dimension>) -> Arc<ResolvedResult> {
    let result = SearchResult { total: 10, dimensions: dims, ..SearchResult::default() };
    Arc::new(ResolvedResult::new(result, HashMap::new(), CONTROL))
}

fn dim(id: &str, counts: &[(u64, u64)]) -> Dimension {
    Dimension {
        id: id.to_string(),
        dictionary_id: "d".to_string(),
        counts: counts.iter().map(|&(key, count)| DimensionCount { key, count }).collect(),
    }
}

fn empty_breakdowns() -> Arc<ResolvedResult> {
    result_with(vec![dim("itembasetypes-Gloves", &[]), dim("itemmods-Gloves", &[]), dim("skills", &[]), dim(CONTROL, &[(0, 10)])])
}

#[test]
fn item_only_empty_result_is_insufficient_and_not_cached() {
    let mut cache = StatCache::new(&EngineSettings::default());
    let state = FilterState::new("s").with_item("Rare Gloves");
    let result = empty_breakdowns();
    assert!(is_insufficient(&state, &result, CONTROL));
    assert_eq!(cache.put_combination(&state, CacheEntry::Raw(result)), StoreOutcome::Insufficient);
    assert!(cache.get_combination(&state).is_none());
}

#[test]
fn skill_filtered_empty_result_is_never_insufficient() {
    let mut cache = StatCache::new(&EngineSettings::default());
    let state = FilterState::new("s").with_item("Rare Gloves").with_skill("Cyclone");
    let result = empty_breakdowns();
    assert!(!is_insufficient(&state, &result, CONTROL));
    assert_eq!(cache.put_combination(&state, CacheEntry::Raw(result.clone())), StoreOutcome::Stored);
    assert_eq!(cache.get_combination(&state), Some(&CacheEntry::Raw(result)));
}

#[test]
fn item_only_with_data_is_cached() {
    let mut cache = StatCache::new(&EngineSettings::default());
    let state = FilterState::new("s").with_item("Rare Gloves");
    let result = result_with(vec![dim("itembasetypes-Gloves", &[(0, 4)])]);
    assert_eq!(cache.put_combination(&state, CacheEntry::Raw(result)), StoreOutcome::Stored);
    assert!(cache.get_combination(&state).is_some());
}

#[test]
fn top_level_cache_is_bounded() {
    let settings = EngineSettings { top_level_capacity: 2, ..EngineSettings::default() };
    let mut cache = StatCache::new(&settings);
    let data = result_with(vec![dim("skills", &[(0, 1)])]);
    for snap in ["a", "b", "c"] {
        cache.put_combination(&FilterState::new(snap), CacheEntry::Raw(data.clone()));
    }
    assert!(cache.get_combination(&FilterState::new("a")).is_none(), "oldest evicted");
    assert!(cache.get_combination(&FilterState::new("c")).is_some());

    // filtered combinations live outside the bounded store
    let filtered = FilterState::new("a").with_item("Rare Boots").with_skill("Spark");
    cache.put_combination(&filtered, CacheEntry::Aggregate(Arc::new(BasetypeAggregate::new())));
    assert_eq!(cache.len(), 3);
}

#[test]
fn partition_splits_hits_and_misses_in_order() {
    let mut cache = StatCache::new(&EngineSettings::default());
    let state = FilterState::new("s").with_item("Rare Helmet");
    cache.put_single(&state, "Lion Pelt", result_with(vec![]));
    let wanted = vec!["Leather Cap".to_string(), "Lion Pelt".to_string(), "Iron Hat".to_string()];
    let part = cache.partition(&state, &wanted);
    assert_eq!(part.cached.len(), 1);
    assert_eq!(part.cached[0].0, "Lion Pelt");
    assert_eq!(part.uncached, ["Leather Cap", "Iron Hat"]);
    assert!(!part.is_complete());

    // singles are scoped by the other filters
    let with_skill = state.clone().with_skill("Spark");
    assert!(!cache.has_single(&with_skill, "Lion Pelt"));
    assert!(cache.has_single(&state, "Lion Pelt"));
}

#[test]
fn dictionaries_live_while_referenced() {
    let store = DictionaryStore::new();
    let dict = store.insert("h1", Dictionary::new("d", ["a"]));
    let again = store.get_or_load("h1", || anyhow::bail!("should not reload")).expect("shared");
    assert!(Arc::ptr_eq(&dict, &again));
    assert_eq!(store.live_count(), 1);

    drop(dict);
    drop(again);
    assert!(store.get("h1").is_none());
    assert_eq!(store.prune(), 1);

    let loaded = store.get_or_load("h1", || Ok(Dictionary::new("d", ["b"]))).expect("reload");
    assert_eq!(loaded.values, ["b"]);
}
