//! Immutable progression tables: ordered levels, per-level costs and the
//! cumulative power each level grants.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::calc::error::CostError;
use crate::calc::key::{KeyResolver, LevelKey, OrdinalLookup, TierStar, TierStarLookup};
use crate::calc::resource::{Resource, ResourceCost};
use crate::calc::validate::check_level_records;

/// How users address levels in a table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyScheme {
    #[default]
    Ordinal,
    TierStar,
}

/// What the cumulative `power` column measures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    #[default]
    Power,
    Percent,
}

/// Raw level descriptor as it appears in a data file.
///
/// Amounts are read as floats so integral-valued numbers such as `1200.0`
/// load; validation rejects negative or fractional amounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordinal: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub star: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub cost: BTreeMap<Resource, f64>,
    pub power: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMeta {
    pub id: String,
    pub name: String,
    pub key_scheme: KeyScheme,
    pub stat: StatKind,
    /// Allowed tier labels. Empty means any label is accepted.
    pub tiers: Vec<String>,
}

impl TableMeta {
    pub fn new(id: impl Into<String>, key_scheme: KeyScheme) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            key_scheme,
            stat: StatKind::Power,
            tiers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Level {
    pub ordinal: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier_star: Option<TierStar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Cost to reach this level from the previous one.
    pub cost: ResourceCost,
    /// Cumulative value once this level is reached.
    pub power: f64,
}

impl Level {
    /// The key a user would pick to address this level.
    pub fn key(&self) -> LevelKey {
        match &self.tier_star {
            Some(key) => LevelKey::TierStar(key.clone()),
            None => LevelKey::Ordinal(self.ordinal),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProgressionTable {
    meta: TableMeta,
    levels: Vec<Level>,
    by_ordinal: OrdinalLookup,
    by_tier_star: Option<TierStarLookup>,
}

impl ProgressionTable {
    /// Validate raw records and build the lookup indices.
    ///
    /// Records without an explicit ordinal take their 0-based position.
    pub fn from_records(meta: TableMeta, records: &[LevelRecord]) -> Result<Self, CostError> {
        let report = check_level_records(&meta, records);
        if let Some(diagnostic) = report.first_error() {
            return Err(CostError::MalformedProgressionData(format!(
                "table '{}': {}: {}",
                meta.id, diagnostic.context, diagnostic.message
            )));
        }

        let levels: Vec<Level> = records
            .iter()
            .enumerate()
            .map(|(position, record)| Level {
                ordinal: record.ordinal.unwrap_or(position as u32),
                tier_star: match (meta.key_scheme, &record.tier, record.star) {
                    (KeyScheme::TierStar, Some(tier), Some(star)) => {
                        Some(TierStar::new(tier.trim(), star))
                    }
                    _ => None,
                },
                label: record.label.clone(),
                cost: record
                    .cost
                    .iter()
                    .map(|(resource, amount)| (*resource, *amount as u64))
                    .collect(),
                power: record.power,
            })
            .collect();

        let by_ordinal = OrdinalLookup::new(levels.iter().map(|level| level.ordinal));
        let by_tier_star = match meta.key_scheme {
            KeyScheme::TierStar => Some(TierStarLookup::new(
                levels
                    .iter()
                    .enumerate()
                    .filter_map(|(position, level)| Some((position, level.tier_star.as_ref()?))),
            )),
            KeyScheme::Ordinal => None,
        };

        Ok(Self {
            meta,
            levels,
            by_ordinal,
            by_tier_star,
        })
    }

    pub fn id(&self) -> &str {
        &self.meta.id
    }

    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn meta(&self) -> &TableMeta {
        &self.meta
    }

    pub fn key_scheme(&self) -> KeyScheme {
        self.meta.key_scheme
    }

    pub fn stat(&self) -> StatKind {
        self.meta.stat
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Position of `key` in [`Self::levels`]. Ordinal keys work on every table;
    /// tier+star keys only on tier-ranked ones.
    pub fn locate(&self, key: &LevelKey) -> Result<usize, CostError> {
        let position = match key {
            LevelKey::Unrecognized(raw) => {
                return Err(CostError::MalformedLevelKey {
                    table: self.meta.id.clone(),
                    key: raw.to_string(),
                })
            }
            LevelKey::Ordinal(ordinal) => self.by_ordinal.position(ordinal),
            LevelKey::TierStar(compound) => self
                .by_tier_star
                .as_ref()
                .and_then(|lookup| lookup.position(compound)),
        };
        position.ok_or_else(|| CostError::UnknownLevelKey {
            table: self.meta.id.clone(),
            key: key.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ordinal: Option<u32>, power: f64, cost: &[(Resource, f64)]) -> LevelRecord {
        LevelRecord {
            ordinal,
            tier: None,
            star: None,
            label: None,
            cost: cost.iter().copied().collect(),
            power,
        }
    }

    fn tiered(tier: &str, star: u8, power: f64) -> LevelRecord {
        LevelRecord {
            tier: Some(tier.to_string()),
            star: Some(star),
            ..record(None, power, &[(Resource::HardenedAlloy, 10.0)])
        }
    }

    #[test]
    fn implicit_ordinals_follow_position() {
        let records = vec![record(None, 0.0, &[]), record(None, 5.0, &[(Resource::Guides, 5.0)])];
        let table =
            ProgressionTable::from_records(TableMeta::new("charms", KeyScheme::Ordinal), &records)
                .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.levels()[1].ordinal, 1);
        assert_eq!(table.locate(&LevelKey::Ordinal(1)), Ok(1));
    }

    #[test]
    fn explicit_ordinals_may_start_at_one() {
        let records = vec![record(Some(1), 0.0, &[]), record(Some(2), 3.0, &[])];
        let table =
            ProgressionTable::from_records(TableMeta::new("t", KeyScheme::Ordinal), &records)
                .unwrap();
        assert_eq!(table.locate(&LevelKey::Ordinal(2)), Ok(1));
        assert!(matches!(
            table.locate(&LevelKey::Ordinal(0)),
            Err(CostError::UnknownLevelKey { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_ordinals() {
        let records = vec![record(Some(1), 0.0, &[]), record(Some(1), 3.0, &[])];
        let err = ProgressionTable::from_records(TableMeta::new("t", KeyScheme::Ordinal), &records)
            .unwrap_err();
        assert!(matches!(err, CostError::MalformedProgressionData(_)));
    }

    #[test]
    fn rejects_decreasing_power() {
        let records = vec![record(None, 10.0, &[]), record(None, 9.5, &[])];
        let err = ProgressionTable::from_records(TableMeta::new("t", KeyScheme::Ordinal), &records)
            .unwrap_err();
        match err {
            CostError::MalformedProgressionData(message) => assert!(message.contains("power")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn rejects_fractional_costs() {
        let records = vec![record(None, 0.0, &[]), record(None, 1.0, &[(Resource::Guides, 2.5)])];
        assert!(
            ProgressionTable::from_records(TableMeta::new("t", KeyScheme::Ordinal), &records)
                .is_err()
        );
    }

    #[test]
    fn tier_star_keys_resolve_by_compound_key() {
        let records = vec![tiered("Blue", 0, 0.0), tiered("Blue", 1, 10.0), tiered("Purple", 0, 20.0)];
        let table =
            ProgressionTable::from_records(TableMeta::new("gear", KeyScheme::TierStar), &records)
                .unwrap();
        assert_eq!(table.locate(&LevelKey::tier_star("purple", 0)), Ok(2));
        assert_eq!(table.locate(&LevelKey::Ordinal(1)), Ok(1));
        assert_eq!(table.levels()[2].key(), LevelKey::tier_star("Purple", 0));
        assert!(table.locate(&LevelKey::tier_star("Red", 0)).is_err());
    }

    #[test]
    fn rejects_tiers_outside_declared_set() {
        let mut meta = TableMeta::new("gear", KeyScheme::TierStar);
        meta.tiers = vec!["Blue".to_string()];
        let records = vec![tiered("Blue", 0, 0.0), tiered("Teal", 0, 1.0)];
        let err = ProgressionTable::from_records(meta, &records).unwrap_err();
        match err {
            CostError::MalformedProgressionData(message) => assert!(message.contains("Teal")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn tier_star_lookup_on_ordinal_table_is_unknown() {
        let records = vec![record(None, 0.0, &[]), record(None, 1.0, &[])];
        let table =
            ProgressionTable::from_records(TableMeta::new("t", KeyScheme::Ordinal), &records)
                .unwrap();
        assert_eq!(
            table.locate(&LevelKey::tier_star("Blue", 0)),
            Err(CostError::UnknownLevelKey {
                table: "t".to_string(),
                key: "Blue:0".to_string(),
            })
        );
    }

    #[test]
    fn unrecognized_key_is_malformed() {
        let records = vec![record(None, 0.0, &[]), record(None, 1.0, &[])];
        let table =
            ProgressionTable::from_records(TableMeta::new("t", KeyScheme::Ordinal), &records)
                .unwrap();
        assert_eq!(
            table.locate(&LevelKey::Unrecognized(serde_json::json!(-1))),
            Err(CostError::MalformedLevelKey {
                table: "t".to_string(),
                key: "-1".to_string(),
            })
        );
    }
}
