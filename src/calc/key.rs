//! Level keys and the lookup strategies that turn them into table positions.
//!
//! Gear tables are browsed by tier and star rank, the linear gear and charm
//! tables by plain ordinal. Both lookups implement [`KeyResolver`] so the range
//! resolver never cares which one a table uses.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Compound key used by tier-ranked tables, e.g. `("Gold T1", 2)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TierStar {
    pub tier: String,
    pub star: u8,
}

impl TierStar {
    pub fn new(tier: impl Into<String>, star: u8) -> Self {
        Self {
            tier: tier.into(),
            star,
        }
    }
}

/// A reference to one level, as chosen by a user.
///
/// Clients send half-finished selections (`null`, negative ordinals, stars out
/// of range). Those land in `Unrecognized` with the raw value kept, so they
/// survive a save/load round trip and fail only when the range is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LevelKey {
    Ordinal(u32),
    TierStar(TierStar),
    Unrecognized(serde_json::Value),
}

impl LevelKey {
    pub fn tier_star(tier: impl Into<String>, star: u8) -> Self {
        Self::TierStar(TierStar::new(tier, star))
    }

    /// Placeholder for a side the client left out.
    pub fn unset() -> Self {
        Self::Unrecognized(serde_json::Value::Null)
    }
}

impl From<u32> for LevelKey {
    fn from(ordinal: u32) -> Self {
        Self::Ordinal(ordinal)
    }
}

impl fmt::Display for LevelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ordinal(ordinal) => write!(f, "{ordinal}"),
            Self::TierStar(key) => write!(f, "{}:{}", key.tier, key.star),
            Self::Unrecognized(raw) => write!(f, "{raw}"),
        }
    }
}

/// `"7"` parses as an ordinal, `"Gold T1:2"` as tier + star.
impl FromStr for LevelKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("empty level key".to_string());
        }
        if let Ok(ordinal) = trimmed.parse::<u32>() {
            return Ok(Self::Ordinal(ordinal));
        }
        let Some((tier, star)) = trimmed.rsplit_once(':') else {
            return Err(format!("level key '{trimmed}' is neither an ordinal nor TIER:STAR"));
        };
        let tier = tier.trim();
        if tier.is_empty() {
            return Err(format!("level key '{trimmed}' has an empty tier"));
        }
        let star = star
            .trim()
            .parse::<u8>()
            .map_err(|err| format!("level key '{trimmed}' has an invalid star rank: {err}"))?;
        Ok(Self::tier_star(tier, star))
    }
}

/// Lookup strategy from a key to a position in the table's level list.
pub trait KeyResolver {
    type Key: ?Sized;

    fn position(&self, key: &Self::Key) -> Option<usize>;
}

/// Normalize a tier label for lookup: lowercase, collapse whitespace/underscores.
pub fn normalize_tier(label: &str) -> String {
    label
        .to_lowercase()
        .chars()
        .map(|ch| if ch == '_' { ' ' } else { ch })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, Default)]
pub struct OrdinalLookup {
    positions: HashMap<u32, usize>,
}

impl OrdinalLookup {
    pub fn new<I>(ordinals: I) -> Self
    where
        I: IntoIterator<Item = u32>,
    {
        let positions = ordinals
            .into_iter()
            .enumerate()
            .map(|(position, ordinal)| (ordinal, position))
            .collect();
        Self { positions }
    }
}

impl KeyResolver for OrdinalLookup {
    type Key = u32;

    fn position(&self, key: &u32) -> Option<usize> {
        self.positions.get(key).copied()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TierStarLookup {
    positions: HashMap<(String, u8), usize>,
}

impl TierStarLookup {
    /// Builds the index from `(position, key)` pairs.
    pub fn new<'a, I>(keys: I) -> Self
    where
        I: IntoIterator<Item = (usize, &'a TierStar)>,
    {
        let positions = keys
            .into_iter()
            .map(|(position, key)| ((normalize_tier(&key.tier), key.star), position))
            .collect();
        Self { positions }
    }
}

impl KeyResolver for TierStarLookup {
    type Key = TierStar;

    fn position(&self, key: &TierStar) -> Option<usize> {
        self.positions
            .get(&(normalize_tier(&key.tier), key.star))
            .copied()
    }
}
