//! Slot layout and the per-slot selections a user builds up.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::calc::key::LevelKey;
use crate::calc::resolver::UpgradeRange;

/// One equipment slot or charm card as declared by a table's layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSpec {
    pub id: String,
    /// Grouping used by bulk selection (e.g. troop type).
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl SlotSpec {
    pub fn new(id: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            label: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slot {
    #[serde(flatten)]
    pub spec: SlotSpec,
    pub range: Option<UpgradeRange>,
}

/// Ordered slots with optional selections. Evaluation order is declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpgradePlan {
    slots: Vec<Slot>,
}

impl UpgradePlan {
    pub fn from_layout(layout: &[SlotSpec]) -> Self {
        Self {
            slots: layout
                .iter()
                .cloned()
                .map(|spec| Slot { spec, range: None })
                .collect(),
        }
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, slot_id: &str) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.spec.id == slot_id)
    }

    /// Set or clear one slot. Returns false when the slot does not exist.
    pub fn select(&mut self, slot_id: &str, range: Option<UpgradeRange>) -> bool {
        match self.slots.iter_mut().find(|slot| slot.spec.id == slot_id) {
            Some(slot) => {
                slot.range = range;
                true
            }
            None => false,
        }
    }

    /// Give every slot in `category` the same range. Category match ignores
    /// ASCII case. Returns the number of slots updated.
    pub fn apply_bulk(&mut self, category: &str, from: &LevelKey, to: &LevelKey) -> usize {
        let category = category.trim();
        let mut updated = 0;
        for slot in self
            .slots
            .iter_mut()
            .filter(|slot| slot.spec.category.eq_ignore_ascii_case(category))
        {
            slot.range = Some(UpgradeRange::new(from.clone(), to.clone()));
            updated += 1;
        }
        updated
    }

    /// Configured ranges in slot order; unconfigured slots are left out.
    pub fn ranges(&self) -> impl Iterator<Item = &UpgradeRange> {
        self.slots.iter().filter_map(|slot| slot.range.as_ref())
    }

    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = Vec::new();
        for slot in &self.slots {
            if !categories.contains(&slot.spec.category.as_str()) {
                categories.push(slot.spec.category.as_str());
            }
        }
        categories
    }

    /// Snapshot of the configured selections keyed by slot id.
    pub fn selections(&self) -> BTreeMap<String, UpgradeRange> {
        self.slots
            .iter()
            .filter_map(|slot| Some((slot.spec.id.clone(), slot.range.clone()?)))
            .collect()
    }

    /// Apply saved selections. Ids not in the layout are returned, not applied.
    pub fn restore(&mut self, selections: &BTreeMap<String, UpgradeRange>) -> Vec<String> {
        let mut unknown = Vec::new();
        for (slot_id, range) in selections {
            if !self.select(slot_id, Some(range.clone())) {
                unknown.push(slot_id.clone());
            }
        }
        unknown
    }
}
