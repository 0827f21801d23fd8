//! Decoded survey payloads and the keys used to persist selection preferences.

use serde::{Deserialize, Serialize};

/// One decoded search response.
///
/// - `total`: population count reported by the upstream service
/// - `dimensions`: frequency breakdowns in wire order
/// - `value_lists`: auxiliary typed value lists (not used for statistics)
/// - `dictionary_refs`: dictionaries the dimensions resolve their keys against
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchResult {
    pub total: u64,
    pub dimensions: Vec<Dimension>,
    pub value_lists: Vec<ValueList>,
    pub dictionary_refs: Vec<DictionaryRef>,
}

impl SearchResult {
    pub fn dimension(&self, id: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.id == id)
    }

}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dimension {
    pub id: String,
    pub dictionary_id: String,
    pub counts: Vec<DimensionCount>,
}

impl Dimension {
    pub fn sum(&self) -> u64 {
        self.counts.iter().map(|c| c.count).sum()
    }
}

/// `key` is a positional index into the referenced dictionary's `values`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionCount {
    pub key: u64,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionaryRef {
    pub id: String,
    pub hash: String,
}

/// Where a dictionary instance was loaded from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DictionarySource {
    #[default]
    Api,
    Fixture,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dictionary {
    pub id: String,
    pub values: Vec<String>,
    pub properties: Vec<DictionaryProperty>,
    pub source: DictionarySource,
}

impl Dictionary {
    pub fn new<I, S>(id: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { id: id.to_string(), values: values.into_iter().map(Into::into).collect(), ..Self::default() }
    }

    /// Label at `key`, treating an empty string as absent.
    pub fn label(&self, key: u64) -> Option<&str> {
        usize::try_from(key).ok().and_then(|i| self.values.get(i)).map(String::as_str).filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionaryProperty {
    pub id: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueList {
    pub id: String,
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Value {
    pub str: Option<String>,
    pub number: Option<u64>,
    pub numbers: Vec<u64>,
    pub strs: Vec<String>,
    pub boolean: Option<bool>,
}

/// Identity of a saved basetype selection: one attribute group, under one
/// item category, for one combination of the other filters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PreferenceKey {
    pub category: String,
    pub group_key: String,
    pub combo_key: String,
}

impl PreferenceKey {
    pub fn storage_key(&self) -> String {
        format!("{}/{}/{}", self.category, self.group_key, self.combo_key)
    }
}
