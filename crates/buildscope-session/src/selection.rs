//! Basetype selection inside one expanded attribute group.
//!
//! ```text
//! Collapsed --expand--> Previewing --toggle/reset--> Pending
//! Pending --apply--> Previewing (members committed)
//! Pending --cancel--> Previewing (pending discarded)
//! any --collapse--> Collapsed
//! ```

use buildscope_core::error::{Error, Result};
use buildscope_core::filter::ItemCategory;
use buildscope_stats::taxonomy::{self, parse_group_key, Attribute};
use buildscope_stats::GroupEntry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSelection {
    pub group_key: String,
    pub category: ItemCategory,
    pub attribute: Attribute,
    pub items: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preview {
    pub group_key: String,
    pub category: ItemCategory,
    pub attribute: Attribute,
    /// Members of this group in the committed basetype filter.
    pub committed: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionState {
    #[default]
    Collapsed,
    Previewing(Preview),
    Pending { preview: Preview, pending: PendingSelection },
}

#[derive(Debug, Default)]
pub struct SelectionMachine {
    state: SelectionState,
}

impl SelectionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn pending(&self) -> Option<&PendingSelection> {
        match &self.state {
            SelectionState::Pending { pending, .. } => Some(pending),
            _ => None,
        }
    }

    pub fn expanded_group(&self) -> Option<&Preview> {
        match &self.state {
            SelectionState::Collapsed => None,
            SelectionState::Previewing(p) | SelectionState::Pending { preview: p, .. } => Some(p),
        }
    }

    /// Open `group_key`. Re-expanding the open group keeps its pending set;
    /// expanding another group discards it.
    pub fn expand(&mut self, group_key: &str, committed: &BTreeSet<String>) -> Result<()> {
        if self.expanded_group().is_some_and(|p| p.group_key == group_key) {
            return Ok(());
        }
        let (attribute, category) =
            parse_group_key(group_key).ok_or_else(|| Error::NotFound(format!("attribute group '{group_key}'")))?;
        let members = taxonomy::members(category, attribute);
        let committed = committed.iter().filter(|b| members.contains(&b.as_str())).cloned().collect();
        self.state = SelectionState::Previewing(Preview { group_key: group_key.to_string(), category, attribute, committed });
        Ok(())
    }

    pub fn collapse(&mut self) {
        self.state = SelectionState::Collapsed;
    }

    fn preview_and_pending(&mut self) -> Result<(Preview, PendingSelection)> {
        match std::mem::take(&mut self.state) {
            SelectionState::Collapsed => Err(Error::Operation("no attribute group is expanded".to_string())),
            SelectionState::Previewing(preview) => {
                let pending = PendingSelection {
                    group_key: preview.group_key.clone(),
                    category: preview.category,
                    attribute: preview.attribute,
                    items: preview.committed.clone(),
                };
                Ok((preview, pending))
            }
            SelectionState::Pending { preview, pending } => Ok((preview, pending)),
        }
    }

    /// Flip `member` in the pending set, starting from the committed members
    /// when nothing is pending yet.
    pub fn toggle(&mut self, member: &str) -> Result<&PendingSelection> {
        if let Some(p) = self.expanded_group() {
            if !taxonomy::members(p.category, p.attribute).contains(&member) {
                return Err(Error::NotFound(format!("'{member}' is not in group {}", p.group_key)));
            }
        }
        let (preview, mut pending) = self.preview_and_pending()?;
        if !pending.items.remove(member) {
            pending.items.insert(member.to_string());
        }
        self.state = SelectionState::Pending { preview, pending };
        self.pending().ok_or_else(|| Error::Operation("selection lost".to_string()))
    }

    /// Replace the pending set with the `defaults` that belong to the group.
    pub fn reset_to_default(&mut self, defaults: Vec<String>) -> Result<&PendingSelection> {
        let (preview, mut pending) = self.preview_and_pending()?;
        let members = taxonomy::members(preview.category, preview.attribute);
        pending.items = defaults.into_iter().filter(|d| members.contains(&d.as_str())).collect();
        self.state = SelectionState::Pending { preview, pending };
        self.pending().ok_or_else(|| Error::Operation("selection lost".to_string()))
    }

    /// Commit the pending set and return it. The group stays expanded.
    pub fn apply(&mut self) -> Result<PendingSelection> {
        match std::mem::take(&mut self.state) {
            SelectionState::Pending { mut preview, pending } => {
                preview.committed = pending.items.clone();
                self.state = SelectionState::Previewing(preview);
                Ok(pending)
            }
            other => {
                self.state = other;
                Err(Error::Operation("nothing pending to apply".to_string()))
            }
        }
    }

    /// Drop the pending set; the committed filter is untouched.
    pub fn cancel(&mut self) {
        if let SelectionState::Pending { preview, .. } = &self.state {
            self.state = SelectionState::Previewing(preview.clone());
        }
    }
}

/// Default members for a group: the saved preference (limited to the group's
/// members), else the `n` most observed members, else the first `n` of the
/// static priority list.
pub fn default_selection(
    saved: Option<Vec<String>>,
    observed: Option<&GroupEntry>,
    category: ItemCategory,
    attribute: Attribute,
    n: usize,
) -> Vec<String> {
    let members = taxonomy::members(category, attribute);
    let saved: Vec<String> = saved.unwrap_or_default().into_iter().filter(|s| members.contains(&s.as_str())).collect();
    if !saved.is_empty() {
        return saved;
    }
    if let Some(group) = observed.filter(|g| !g.members.is_empty()) {
        let mut members: Vec<_> = group.members.iter().collect();
        members.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        return members.into_iter().take(n).map(|m| m.name.clone()).collect();
    }
    members.iter().take(n).map(ToString::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_keeps_only_group_members() {
        let mut machine = SelectionMachine::new();
        machine.expand("group_dex_gloves", &BTreeSet::new()).expect("expand");
        let pending = machine
            .reset_to_default(vec!["Lion Pelt".to_string(), "Slink Gloves".to_string()])
            .expect("reset");
        assert_eq!(pending.items.iter().collect::<Vec<_>>(), ["Slink Gloves"]);
    }
}
