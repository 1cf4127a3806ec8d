//! A calculator instance: one shared table plus the user's slot selections.
//! Every mutation is followed by an explicit recompute; nothing is cached.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::calc::aggregate::{aggregate, AggregateCost};
use crate::calc::key::LevelKey;
use crate::calc::ownership::{compare, Balance};
use crate::calc::plan::{SlotSpec, UpgradePlan};
use crate::calc::resolver::{resolve, RangeCost, UpgradeRange};
use crate::calc::resource::{Resource, ResourceCost};
use crate::calc::table::ProgressionTable;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SlotOutcome {
    Unset,
    NonIncreasing,
    Costed(RangeCost),
    Invalid { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotCost {
    pub slot_id: String,
    pub category: String,
    pub range: Option<UpgradeRange>,
    pub outcome: SlotOutcome,
}

#[derive(Debug, Clone)]
pub struct CalculatorSession {
    table: Arc<ProgressionTable>,
    plan: UpgradePlan,
}

impl CalculatorSession {
    pub fn new(table: Arc<ProgressionTable>, layout: &[SlotSpec]) -> Self {
        Self {
            table,
            plan: UpgradePlan::from_layout(layout),
        }
    }

    pub fn table(&self) -> &ProgressionTable {
        &self.table
    }

    pub fn plan(&self) -> &UpgradePlan {
        &self.plan
    }

    /// Set or clear one slot's range. False when the slot is not in the layout.
    pub fn select(&mut self, slot_id: &str, range: Option<UpgradeRange>) -> bool {
        self.plan.select(slot_id, range)
    }

    pub fn clear(&mut self, slot_id: &str) -> bool {
        self.plan.select(slot_id, None)
    }

    /// Point every slot of `category` at the same range, then recompute.
    pub fn apply_bulk(&mut self, category: &str, from: &LevelKey, to: &LevelKey) -> AggregateCost {
        let updated = self.plan.apply_bulk(category, from, to);
        debug!(table = self.table.id(), category, updated, "bulk selection applied");
        self.recompute()
    }

    pub fn recompute(&self) -> AggregateCost {
        aggregate(&self.table, self.plan.ranges())
    }

    /// Per-slot resolution in layout order, including unset and invalid slots.
    pub fn breakdown(&self) -> Vec<SlotCost> {
        self.plan
            .slots()
            .iter()
            .map(|slot| {
                let outcome = match &slot.range {
                    None => SlotOutcome::Unset,
                    Some(range) => match resolve(&self.table, range) {
                        Ok(Some(range_cost)) => SlotOutcome::Costed(range_cost),
                        Ok(None) => SlotOutcome::NonIncreasing,
                        Err(err) => SlotOutcome::Invalid {
                            message: err.to_string(),
                        },
                    },
                };
                SlotCost {
                    slot_id: slot.spec.id.clone(),
                    category: slot.spec.category.clone(),
                    range: slot.range.clone(),
                    outcome,
                }
            })
            .collect()
    }

    pub fn compare(&self, owned: &ResourceCost) -> BTreeMap<Resource, Balance> {
        compare(&self.recompute(), owned)
    }

    pub fn selections(&self) -> BTreeMap<String, UpgradeRange> {
        self.plan.selections()
    }

    /// Apply saved selections; returns slot ids the layout does not know.
    pub fn restore(&mut self, selections: &BTreeMap<String, UpgradeRange>) -> Vec<String> {
        self.plan.restore(selections)
    }
}
