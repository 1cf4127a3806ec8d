use serde::{Deserialize, Serialize};

use crate::calc::error::CostError;
use crate::calc::key::LevelKey;
use crate::calc::resource::ResourceCost;
use crate::calc::table::ProgressionTable;

/// One user-configured `from -> to` selection. A missing side deserializes as
/// an unset key rather than failing the surrounding document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeRange {
    #[serde(default = "LevelKey::unset")]
    pub from: LevelKey,
    #[serde(default = "LevelKey::unset")]
    pub to: LevelKey,
}

impl UpgradeRange {
    pub fn new(from: LevelKey, to: LevelKey) -> Self {
        Self { from, to }
    }

    pub fn ordinals(from: u32, to: u32) -> Self {
        Self::new(LevelKey::Ordinal(from), LevelKey::Ordinal(to))
    }
}

/// Cost of one resolved, non-degenerate range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeCost {
    pub from_position: usize,
    pub to_position: usize,
    pub cost: ResourceCost,
    /// Cumulative power of the level at `to_position`.
    pub terminal_power: f64,
}

/// Cost of moving from `range.from` to `range.to`.
///
/// Charges every level in `(from, to]`: a level's cost is the price of
/// entering it. Returns `Ok(None)` when `from` is not strictly below `to`.
pub fn resolve(
    table: &ProgressionTable,
    range: &UpgradeRange,
) -> Result<Option<RangeCost>, CostError> {
    let from_position = table.locate(&range.from)?;
    let to_position = table.locate(&range.to)?;
    if from_position >= to_position {
        return Ok(None);
    }

    let entered = &table.levels()[from_position + 1..=to_position];
    let mut cost = ResourceCost::new();
    for level in entered {
        cost.add_from(&level.cost);
    }
    let terminal_power = table.levels()[to_position].power;

    Ok(Some(RangeCost {
        from_position,
        to_position,
        cost,
        terminal_power,
    }))
}
