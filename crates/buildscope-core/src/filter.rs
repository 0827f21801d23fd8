//! Filter state, canonical cache signatures, and upstream fetch intents.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{Error, Result};

pub const OVERVIEW_MODE: &str = "keepers";
pub const RESULT_TYPE: &str = "exp";

/// Rare equipment slots whose basetypes can be grouped and aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemCategory {
    BodyArmour,
    Boots,
    Gloves,
    Helmet,
    Shield,
}

impl ItemCategory {
    pub const ALL: [ItemCategory; 5] =
        [ItemCategory::BodyArmour, ItemCategory::Boots, ItemCategory::Gloves, ItemCategory::Helmet, ItemCategory::Shield];

    /// Suffix used in dimension ids, e.g. `itembasetypes-BodyArmour`.
    pub fn code(self) -> &'static str {
        match self {
            ItemCategory::BodyArmour => "BodyArmour",
            ItemCategory::Boots => "Boots",
            ItemCategory::Gloves => "Gloves",
            ItemCategory::Helmet => "Helmet",
            ItemCategory::Shield => "Shield",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    /// Name of the category in the attribute taxonomy.
    pub fn display_name(self) -> &'static str {
        match self {
            ItemCategory::BodyArmour => "Body Armour",
            ItemCategory::Boots => "Boots",
            ItemCategory::Gloves => "Gloves",
            ItemCategory::Helmet => "Helmets",
            ItemCategory::Shield => "Shield",
        }
    }

    /// Item selector that filters the population to rares of this slot.
    pub fn rare_item(self) -> &'static str {
        match self {
            ItemCategory::BodyArmour => "Rare Body Armour",
            ItemCategory::Boots => "Rare Boots",
            ItemCategory::Gloves => "Rare Gloves",
            ItemCategory::Helmet => "Rare Helmet",
            ItemCategory::Shield => "Rare Shield",
        }
    }

    pub fn from_rare_item(item: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.rare_item() == item)
    }

    pub fn basetype_dimension(self) -> String {
        format!("itembasetypes-{}", self.code())
    }

    pub fn modifier_dimension(self) -> String {
        format!("itemmods-{}", self.code())
    }
}

/// Item selector for a category code, falling back to `Rare <code>` for
/// codes outside the known slots.
pub fn rare_item_selector(code: &str) -> String {
    ItemCategory::from_code(code).map_or_else(|| format!("Rare {code}"), |c| c.rare_item().to_string())
}

/// Active filters of one query. Every axis is an ordered set, so two states
/// holding the same members produce the same signature regardless of the
/// order they were selected in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    pub snapshot_id: String,
    pub items: BTreeSet<String>,
    pub basetypes: BTreeSet<String>,
    pub modifiers: BTreeSet<String>,
    pub skills: BTreeSet<String>,
}

impl FilterState {
    pub fn new(snapshot_id: &str) -> Self {
        Self { snapshot_id: snapshot_id.to_string(), ..Self::default() }
    }

    pub fn with_item(mut self, item: &str) -> Self {
        self.select_item(item);
        self
    }

    pub fn with_skill(mut self, skill: &str) -> Self {
        self.skills.insert(skill.to_string());
        self
    }

    /// Makes `item` the only selected item. Switching to a different item
    /// drops basetype and modifier filters, which only apply to one item.
    pub fn select_item(&mut self, item: &str) {
        if self.items.len() == 1 && self.items.contains(item) {
            return;
        }
        self.items.clear();
        self.items.insert(item.to_string());
        self.basetypes.clear();
        self.modifiers.clear();
    }

    pub fn clear_items(&mut self) {
        self.items.clear();
        self.basetypes.clear();
        self.modifiers.clear();
    }

    pub fn set_basetypes<I, S>(&mut self, basetypes: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let basetypes: BTreeSet<String> = basetypes.into_iter().map(Into::into).collect();
        if !basetypes.is_empty() && self.items.len() != 1 {
            return Err(Error::Operation(format!("basetype filter needs exactly one item, have {}", self.items.len())));
        }
        self.basetypes = basetypes;
        Ok(())
    }

    pub fn set_modifiers<I, S>(&mut self, modifiers: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let modifiers: BTreeSet<String> = modifiers.into_iter().map(Into::into).collect();
        if !modifiers.is_empty() && self.items.len() != 1 {
            return Err(Error::Operation(format!("modifier filter needs exactly one item, have {}", self.items.len())));
        }
        self.modifiers = modifiers;
        Ok(())
    }

    pub fn set_skills<I, S>(&mut self, skills: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skills = skills.into_iter().map(Into::into).collect();
    }

    /// Category of the single selected item, when it is a known rare slot.
    pub fn category(&self) -> Option<ItemCategory> {
        match self.items.len() {
            1 => self.items.iter().next().and_then(|i| ItemCategory::from_rare_item(i)),
            _ => None,
        }
    }

    /// True when an item is selected and nothing else narrows the query.
    pub fn is_item_only(&self) -> bool {
        !self.items.is_empty() && self.basetypes.is_empty() && self.modifiers.is_empty() && self.skills.is_empty()
    }

    /// Canonical cache key: sorted members per axis, axes in fixed order.
    pub fn signature(&self) -> String {
        let join = |s: &BTreeSet<String>| s.iter().map(String::as_str).collect::<Vec<_>>().join(";");
        format!(
            "{}|items={}|basetypes={}|modifiers={}|skills={}",
            self.snapshot_id,
            join(&self.items),
            join(&self.basetypes),
            join(&self.modifiers),
            join(&self.skills)
        )
    }

    /// Same filters narrowed to exactly one basetype.
    pub fn for_basetype(&self, basetype: &str) -> FilterState {
        let mut state = self.clone();
        state.basetypes = BTreeSet::from([basetype.to_string()]);
        state
    }

    /// Digest of every filter except the basetype set. Identifies the
    /// combination a basetype selection was made under.
    pub fn combo_key(&self) -> String {
        let mut state = self.clone();
        state.basetypes.clear();
        blake3::hash(state.signature().as_bytes()).to_hex().to_string()
    }

    pub fn fetch_intent(&self) -> FetchIntent {
        let mut params = Vec::new();
        for item in &self.items {
            params.push(("items".to_string(), item.clone()));
        }
        let category = self.category();
        if let Some(cat) = category {
            for bt in &self.basetypes {
                params.push((cat.basetype_dimension(), bt.clone()));
            }
            for m in &self.modifiers {
                params.push((cat.modifier_dimension(), m.clone()));
            }
        }
        for skill in &self.skills {
            params.push(("skills".to_string(), skill.clone()));
        }
        params.push(("overview".to_string(), OVERVIEW_MODE.to_string()));
        params.push(("type".to_string(), RESULT_TYPE.to_string()));
        FetchIntent::Search { snapshot_id: self.snapshot_id.clone(), params }
    }
}

/// A request the host environment should perform on the engine's behalf.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FetchIntent {
    Search { snapshot_id: String, params: Vec<(String, String)> },
    Dictionary { hash: String },
}

impl FetchIntent {
    /// Request path relative to the upstream API root.
    pub fn path(&self) -> String {
        match self {
            FetchIntent::Search { snapshot_id, params } => {
                let query = params
                    .iter()
                    .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                    .collect::<Vec<_>>()
                    .join("&");
                format!("/poe1/api/builds/{}/search?{}", urlencoding::encode(snapshot_id), query)
            }
            FetchIntent::Dictionary { hash } => format!("/poe1/api/builds/dictionary/{}", urlencoding::encode(hash)),
        }
    }

    /// Stable content-addressed name, used by file-backed transports.
    pub fn digest(&self) -> String {
        match self {
            FetchIntent::Search { .. } => blake3::hash(self.path().as_bytes()).to_hex().to_string(),
            FetchIntent::Dictionary { hash } => hash.clone(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            FetchIntent::Search { params, .. } => params
                .iter()
                .filter(|(k, _)| k != "overview" && k != "type")
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(", "),
            FetchIntent::Dictionary { hash } => format!("dictionary {hash}"),
        }
    }
}
