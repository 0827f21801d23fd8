//! Combining many resolved results into one frequency table.
//!
//! Two shapes exist. [`merge_calls`] unions dimensions from separate calls
//! over the same population slice. [`BasetypeAggregate`] pools one result per
//! basetype, deduplicating modifiers within each result before pooling.

use buildscope_core::filter::ItemCategory;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use tracing::debug;

use crate::dimension::{
    by_count_desc, display_name, group_entries, percentage, Entry, GroupEntry, ProcessedDimension, Row,
    BASETYPES_PREFIX, MODIFIERS_PREFIX, SKILLS_ID,
};
use crate::resolve::ResolvedResult;
use crate::taxonomy::{self, Attribute};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedResult {
    pub true_total: u64,
    pub dimensions: Vec<ProcessedDimension>,
}

impl MergedResult {
    pub fn dimension(&self, id: &str) -> Option<&ProcessedDimension> {
        self.dimensions.iter().find(|d| d.id == id)
    }
}

struct MergeSlot {
    id: String,
    dictionary_id: String,
    entries: Vec<Entry>,
    by_name: HashMap<String, usize>,
}

/// Union dimensions by id in first-seen order and entries by name. Counts are
/// summed first; percentages are computed once at the end against the summed
/// normalization totals of every input.
pub fn merge_calls(results: &[ResolvedResult]) -> MergedResult {
    let grand_total: u64 = results.iter().map(|r| r.true_total).sum();
    let mut slots: Vec<MergeSlot> = Vec::new();
    let mut by_id: HashMap<String, usize> = HashMap::new();

    for res in results {
        for dim in &res.result.dimensions {
            let idx = *by_id.entry(dim.id.clone()).or_insert_with(|| {
                slots.push(MergeSlot {
                    id: dim.id.clone(),
                    dictionary_id: dim.dictionary_id.clone(),
                    entries: Vec::new(),
                    by_name: HashMap::new(),
                });
                slots.len() - 1
            });
            let slot = &mut slots[idx];
            for c in &dim.counts {
                let label = res.label(dim, c.key);
                match slot.by_name.get(&label.name) {
                    Some(&i) => slot.entries[i].count += c.count,
                    None => {
                        slot.by_name.insert(label.name.clone(), slot.entries.len());
                        slot.entries.push(Entry {
                            key: c.key,
                            name: label.name,
                            count: c.count,
                            percentage: 0.0,
                            resolved: label.resolved,
                        });
                    }
                }
            }
        }
    }

    let dimensions = slots
        .into_iter()
        .map(|slot| {
            let mut entries = slot.entries;
            for e in &mut entries {
                e.percentage = percentage(e.count, grand_total);
            }
            entries.sort_by(|a, b| by_count_desc((a.count, &a.name), (b.count, &b.name)));
            let unresolved = entries.iter().filter(|e| !e.resolved).count();
            let rows = match slot.id.strip_prefix(BASETYPES_PREFIX).and_then(ItemCategory::from_code) {
                Some(category) => group_entries(entries, category),
                None => entries.into_iter().map(Row::Entry).collect(),
            };
            ProcessedDimension {
                display_name: display_name(&slot.id),
                id: slot.id,
                dictionary_id: slot.dictionary_id,
                true_total: grand_total,
                rows,
                unresolved,
            }
        })
        .collect::<Vec<_>>();

    debug!(calls = results.len(), dimensions = dimensions.len(), true_total = grand_total, "merged call results");
    MergedResult { true_total: grand_total, dimensions }
}

/// Pooled statistics over a set of basetypes. Contributions are stored per
/// basetype, so merging two aggregates is a union and the result does not
/// depend on the order basetypes arrived in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BasetypeAggregate {
    totals: BTreeMap<String, u64>,
    modifiers: BTreeMap<String, BTreeMap<String, u64>>,
    skills: BTreeMap<String, BTreeMap<String, u64>>,
}

impl BasetypeAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contribution of one basetype-filtered result. Modifiers appearing in
    /// several modifier dimensions of the same result count once, at their
    /// highest count.
    pub fn from_result(basetype: &str, result: &ResolvedResult) -> Self {
        let mut modifiers: BTreeMap<String, u64> = BTreeMap::new();
        let mut skills: BTreeMap<String, u64> = BTreeMap::new();
        for dim in &result.result.dimensions {
            if dim.id.starts_with(MODIFIERS_PREFIX) {
                for c in &dim.counts {
                    let name = result.label(dim, c.key).name;
                    let seen = modifiers.entry(name).or_insert(0);
                    *seen = (*seen).max(c.count);
                }
            } else if dim.id == SKILLS_ID {
                for c in &dim.counts {
                    *skills.entry(result.label(dim, c.key).name).or_insert(0) += c.count;
                }
            }
        }

        let mut out = Self::default();
        out.totals.insert(basetype.to_string(), result.true_total);
        for (name, count) in modifiers {
            out.modifiers.entry(name).or_default().insert(basetype.to_string(), count);
        }
        for (name, count) in skills {
            out.skills.entry(name).or_default().insert(basetype.to_string(), count);
        }
        out
    }

    pub fn add(&mut self, basetype: &str, result: &ResolvedResult) {
        self.merge(Self::from_result(basetype, result));
    }

    /// Union with another aggregate. A basetype present in both keeps the
    /// incoming contribution.
    pub fn merge(&mut self, other: BasetypeAggregate) {
        for (basetype, total) in other.totals {
            self.remove_basetype(&basetype);
            self.totals.insert(basetype, total);
        }
        for (name, per) in other.modifiers {
            self.modifiers.entry(name).or_default().extend(per);
        }
        for (name, per) in other.skills {
            self.skills.entry(name).or_default().extend(per);
        }
    }

    fn remove_basetype(&mut self, basetype: &str) {
        if self.totals.remove(basetype).is_none() {
            return;
        }
        for table in [&mut self.modifiers, &mut self.skills] {
            for per in table.values_mut() {
                per.remove(basetype);
            }
            table.retain(|_, per| !per.is_empty());
        }
    }

    pub fn contains(&self, basetype: &str) -> bool {
        self.totals.contains_key(basetype)
    }

    pub fn basetypes(&self) -> impl Iterator<Item = &str> {
        self.totals.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Sum of each basetype's own normalization total.
    pub fn pool_total(&self) -> u64 {
        self.totals.values().sum()
    }

    pub fn finish(&self) -> AggregateReport {
        let pool = self.pool_total();
        let mut distribution: Vec<DistributionEntry> = self
            .totals
            .iter()
            .map(|(name, count)| DistributionEntry { name: name.clone(), count: *count, percentage: percentage(*count, pool) })
            .collect();
        distribution.sort_by(|a, b| by_count_desc((a.count, &a.name), (b.count, &b.name)));
        debug!(basetypes = distribution.len(), pool, "aggregate finished");

        AggregateReport {
            total_builds: pool,
            distribution,
            modifiers: self.table_entries(&self.modifiers, pool),
            skills: self.table_entries(&self.skills, pool),
        }
    }

    fn table_entries(&self, table: &BTreeMap<String, BTreeMap<String, u64>>, pool: u64) -> Vec<AggregateEntry> {
        let mut out: Vec<AggregateEntry> = table
            .iter()
            .map(|(name, per)| {
                let count = per.values().sum();
                let breakdown = per
                    .iter()
                    .map(|(basetype, c)| BasetypeShare {
                        basetype: basetype.clone(),
                        percentage: percentage(*c, self.totals.get(basetype).copied().unwrap_or(0)),
                    })
                    .collect();
                AggregateEntry { name: name.clone(), count, percentage: percentage(count, pool), breakdown }
            })
            .collect();
        out.sort_by(|a, b| by_count_desc((a.count, &a.name), (b.count, &b.name)));
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionEntry {
    pub name: String,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasetypeShare {
    pub basetype: String,
    pub percentage: f64,
}

impl fmt::Display for BasetypeShare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:.1}%", self.basetype, self.percentage)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateEntry {
    pub name: String,
    pub count: u64,
    pub percentage: f64,
    pub breakdown: Vec<BasetypeShare>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    pub total_builds: u64,
    pub distribution: Vec<DistributionEntry>,
    pub modifiers: Vec<AggregateEntry>,
    pub skills: Vec<AggregateEntry>,
}

impl AggregateReport {
    /// Copy with modifier and skill tables cut to `limit` rows.
    pub fn truncated(&self, limit: usize) -> AggregateReport {
        let mut out = self.clone();
        out.modifiers.truncate(limit);
        out.skills.truncate(limit);
        out
    }
}

/// Synthetic attribute groups for a category when the basetype filter is
/// already applied: each group reads 100% if it holds a selected basetype.
pub fn reconstruct_groups<'a, I>(category: ItemCategory, selected: I) -> Vec<GroupEntry>
where
    I: IntoIterator<Item = &'a str>,
{
    let selected: BTreeSet<&str> = selected.into_iter().collect();
    Attribute::ALL
        .into_iter()
        .map(|attribute| {
            let hits = taxonomy::members(category, attribute).iter().filter(|m| selected.contains(*m)).count();
            let (count, pct) = if hits > 0 { (100, 100.0) } else { (0, 0.0) };
            GroupEntry {
                group_key: taxonomy::group_key(attribute, category),
                attribute,
                category,
                name: taxonomy::group_name(attribute, category, hits),
                count,
                percentage: pct,
                members: Vec::new(),
                reconstructed: true,
            }
        })
        .collect()
}
