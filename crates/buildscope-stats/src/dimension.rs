//! Per-dimension processing: label resolution, percentage normalization,
//! ordering, and attribute grouping of basetype dimensions.

use buildscope_core::filter::ItemCategory;
use buildscope_core::types::{Dictionary, Dimension, SearchResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::resolve::resolve;
use crate::taxonomy::{self, Attribute};

pub const BASETYPES_PREFIX: &str = "itembasetypes-";
pub const MODIFIERS_PREFIX: &str = "itemmods";
pub const SKILLS_ID: &str = "skills";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionKind {
    /// Basetype breakdown; grouping applies only when the category is known.
    Basetypes(Option<ItemCategory>),
    Modifiers,
    Skills,
    Control,
    Other,
}

pub fn classify(id: &str, control_dimension: &str) -> DimensionKind {
    if id == control_dimension {
        DimensionKind::Control
    } else if let Some(code) = id.strip_prefix(BASETYPES_PREFIX) {
        DimensionKind::Basetypes(ItemCategory::from_code(code))
    } else if id.starts_with(MODIFIERS_PREFIX) {
        DimensionKind::Modifiers
    } else if id == SKILLS_ID {
        DimensionKind::Skills
    } else {
        DimensionKind::Other
    }
}

fn split_camel(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, ch) in s.chars().enumerate() {
        if i > 0 && ch.is_uppercase() {
            out.push(' ');
        }
        out.push(ch);
    }
    out
}

/// Human-readable dimension title, e.g. `itembasetypes-BodyArmour` becomes
/// `Item Types: Body Armour`.
pub fn display_name(id: &str) -> String {
    let prefixes = [(BASETYPES_PREFIX, "Item Types: "), ("itemmods-", "Mods: "), ("skills-", "Skills: ")];
    for (prefix, label) in prefixes {
        if let Some(rest) = id.strip_prefix(prefix) {
            return format!("{label}{}", split_camel(rest));
        }
    }
    let spaced = split_camel(id);
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Normalization denominator: the control dimension's sum when the result
/// carries one, else the reported total.
pub fn true_total(result: &SearchResult, control_dimension: &str) -> u64 {
    result.dimension(control_dimension).map_or(result.total, Dimension::sum)
}

#[allow(clippy::cast_precision_loss)]
pub fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    count as f64 / total as f64 * 100.0
}

/// One-decimal rendering used for display only.
pub fn format_percentage(p: f64) -> String {
    format!("{p:.1}")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub key: u64,
    pub name: String,
    pub count: u64,
    pub percentage: f64,
    pub resolved: bool,
}

impl Entry {
    pub fn display_percentage(&self) -> String {
        format_percentage(self.percentage)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupEntry {
    pub group_key: String,
    pub attribute: Attribute,
    pub category: ItemCategory,
    pub name: String,
    pub count: u64,
    pub percentage: f64,
    /// Member entries in taxonomy order; empty for reconstructed groups.
    pub members: Vec<Entry>,
    pub reconstructed: bool,
}

impl GroupEntry {
    pub fn member_names(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.name.as_str()).collect()
    }

    pub fn display_percentage(&self) -> String {
        format_percentage(self.percentage)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Row {
    Group(GroupEntry),
    Entry(Entry),
}

impl Row {
    pub fn name(&self) -> &str {
        match self {
            Row::Group(g) => &g.name,
            Row::Entry(e) => &e.name,
        }
    }

    pub fn count(&self) -> u64 {
        match self {
            Row::Group(g) => g.count,
            Row::Entry(e) => e.count,
        }
    }

    pub fn percentage(&self) -> f64 {
        match self {
            Row::Group(g) => g.percentage,
            Row::Entry(e) => e.percentage,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedDimension {
    pub id: String,
    pub dictionary_id: String,
    pub display_name: String,
    pub true_total: u64,
    pub rows: Vec<Row>,
    pub unresolved: usize,
}

impl ProcessedDimension {
    /// First `limit` rows, for presentation.
    pub fn top(&self, limit: usize) -> &[Row] {
        &self.rows[..self.rows.len().min(limit)]
    }

    pub fn groups(&self) -> impl Iterator<Item = &GroupEntry> {
        self.rows.iter().filter_map(|r| match r {
            Row::Group(g) => Some(g),
            Row::Entry(_) => None,
        })
    }

    pub fn group(&self, group_key: &str) -> Option<&GroupEntry> {
        self.groups().find(|g| g.group_key == group_key)
    }

    /// Ungrouped entries plus every group member.
    pub fn entries(&self) -> Vec<&Entry> {
        let mut out = Vec::new();
        for row in &self.rows {
            match row {
                Row::Group(g) => out.extend(g.members.iter()),
                Row::Entry(e) => out.push(e),
            }
        }
        out
    }
}

/// Count descending, then name ascending.
pub fn by_count_desc(a: (u64, &str), b: (u64, &str)) -> Ordering {
    b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1))
}

/// Resolve, normalize and order the counts of one dimension.
pub fn process(dimension: &Dimension, dictionary: Option<&Dictionary>, true_total: u64) -> Vec<Entry> {
    let mut entries: Vec<Entry> = dimension
        .counts
        .iter()
        .map(|c| {
            let label = resolve(c.key, dictionary);
            Entry {
                key: c.key,
                name: label.name,
                count: c.count,
                percentage: percentage(c.count, true_total),
                resolved: label.resolved,
            }
        })
        .collect();
    entries.sort_by(|a, b| by_count_desc((a.count, &a.name), (b.count, &b.name)));
    entries
}

/// Collapse basetype entries into attribute groups. Groups come first in
/// taxonomy order, leftovers keep their incoming order. An entry joins at
/// most one group.
pub fn group_entries(entries: Vec<Entry>, category: ItemCategory) -> Vec<Row> {
    let mut leftovers: Vec<Option<Entry>> = entries.into_iter().map(Some).collect();
    let mut rows = Vec::new();
    for attribute in Attribute::ALL {
        let mut members = Vec::new();
        for name in taxonomy::members(category, attribute) {
            if let Some(slot) = leftovers.iter_mut().find(|e| e.as_ref().is_some_and(|e| e.name == *name)) {
                if let Some(entry) = slot.take() {
                    members.push(entry);
                }
            }
        }
        if members.is_empty() {
            continue;
        }
        rows.push(Row::Group(GroupEntry {
            group_key: taxonomy::group_key(attribute, category),
            attribute,
            category,
            name: taxonomy::group_name(attribute, category, members.len()),
            count: members.iter().map(|m| m.count).sum(),
            percentage: members.iter().map(|m| m.percentage).sum(),
            members,
            reconstructed: false,
        }));
    }
    rows.extend(leftovers.into_iter().flatten().map(Row::Entry));
    rows
}

pub fn process_dimension(dimension: &Dimension, dictionary: Option<&Dictionary>, true_total: u64) -> ProcessedDimension {
    let entries = process(dimension, dictionary, true_total);
    let unresolved = entries.iter().filter(|e| !e.resolved).count();
    let rows = match dimension.id.strip_prefix(BASETYPES_PREFIX).and_then(ItemCategory::from_code) {
        Some(category) => group_entries(entries, category),
        None => entries.into_iter().map(Row::Entry).collect(),
    };
    ProcessedDimension {
        id: dimension.id.clone(),
        dictionary_id: dimension.dictionary_id.clone(),
        display_name: display_name(&dimension.id),
        true_total,
        rows,
        unresolved,
    }
}
