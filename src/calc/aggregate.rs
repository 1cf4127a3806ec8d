//! Multi-slot aggregation.
//!
//! Resource amounts are summed across ranges. `final_power` is NOT summed:
//! every contributing range overwrites it with its own terminal power, so the
//! last valid range in caller order wins even when an earlier range reached a
//! higher level. The calculators have always displayed that value and users
//! compare against it, so it stays as is.

use serde::Serialize;
use tracing::debug;

use crate::calc::error::CostError;
use crate::calc::resolver::{resolve, RangeCost, UpgradeRange};
use crate::calc::resource::ResourceCost;
use crate::calc::table::ProgressionTable;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// `from` is not strictly below `to`.
    NonIncreasing,
    UnknownKey { message: String },
    /// A side was never chosen or is not a level key at all.
    MalformedKey { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRange {
    /// Position of the range in the evaluated sequence.
    pub index: usize,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateCost {
    pub sum: ResourceCost,
    /// Terminal power of the last contributing range; `None` if nothing contributed.
    pub final_power: Option<f64>,
    pub contributing_ranges: usize,
    pub skipped: Vec<SkippedRange>,
}

impl AggregateCost {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Fold one resolved range in: add its cost, overwrite the power.
    pub fn absorb(&mut self, range_cost: &RangeCost) {
        self.sum.add_from(&range_cost.cost);
        self.final_power = Some(range_cost.terminal_power);
        self.contributing_ranges += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.contributing_ranges == 0
    }
}

/// Resolve every range in order and combine the results. Never fails: a range
/// with an unknown or malformed key, or a non-increasing pair, is recorded in
/// `skipped`.
pub fn aggregate<'a, I>(table: &ProgressionTable, ranges: I) -> AggregateCost
where
    I: IntoIterator<Item = &'a UpgradeRange>,
{
    let mut total = AggregateCost::empty();
    for (index, range) in ranges.into_iter().enumerate() {
        match resolve(table, range) {
            Ok(Some(range_cost)) => total.absorb(&range_cost),
            Ok(None) => total.skipped.push(SkippedRange {
                index,
                reason: SkipReason::NonIncreasing,
            }),
            Err(err) => {
                debug!(table = table.id(), index, "skipping range: {err}");
                let message = err.to_string();
                let reason = match err {
                    CostError::MalformedLevelKey { .. } => SkipReason::MalformedKey { message },
                    _ => SkipReason::UnknownKey { message },
                };
                total.skipped.push(SkippedRange { index, reason });
            }
        }
    }
    total
}
