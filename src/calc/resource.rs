//! Resource names and additive cost vectors.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Resource {
    HardenedAlloy,
    PolishingSolution,
    DesignPlans,
    LunarAmber,
    Guides,
    Designs,
    Secrets,
}

impl Resource {
    pub const ALL: [Resource; 7] = [
        Resource::HardenedAlloy,
        Resource::PolishingSolution,
        Resource::DesignPlans,
        Resource::LunarAmber,
        Resource::Guides,
        Resource::Designs,
        Resource::Secrets,
    ];

    /// Wire name, identical to the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HardenedAlloy => "hardenedAlloy",
            Self::PolishingSolution => "polishingSolution",
            Self::DesignPlans => "designPlans",
            Self::LunarAmber => "lunarAmber",
            Self::Guides => "guides",
            Self::Designs => "designs",
            Self::Secrets => "secrets",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::HardenedAlloy => "Hardened Alloy",
            Self::PolishingSolution => "Polishing Solution",
            Self::DesignPlans => "Design Plans",
            Self::LunarAmber => "Lunar Amber",
            Self::Guides => "Charm Guides",
            Self::Designs => "Charm Designs",
            Self::Secrets => "Charm Secrets",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Accepts the wire name in any case, with or without `_`/`-` separators
/// (`hardenedAlloy`, `hardened_alloy`, `HARDENED-ALLOY`).
impl FromStr for Resource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|ch| ch.is_ascii_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();
        Resource::ALL
            .into_iter()
            .find(|resource| resource.as_str().to_ascii_lowercase() == wanted)
            .ok_or_else(|| format!("unknown resource '{s}'"))
    }
}

/// Resource -> amount. Entries that were ever touched are kept even when zero,
/// so a comparison can report on every resource a table mentions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceCost(BTreeMap<Resource, u64>);

impl ResourceCost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, resource: Resource) -> u64 {
        self.0.get(&resource).copied().unwrap_or(0)
    }

    pub fn contains(&self, resource: Resource) -> bool {
        self.0.contains_key(&resource)
    }

    pub fn set(&mut self, resource: Resource, amount: u64) {
        self.0.insert(resource, amount);
    }

    pub fn add(&mut self, resource: Resource, amount: u64) {
        let entry = self.0.entry(resource).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    /// Elementwise addition of `other` into self.
    pub fn add_from(&mut self, other: &ResourceCost) {
        for (resource, amount) in other.iter() {
            self.add(resource, amount);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Resource, u64)> + '_ {
        self.0.iter().map(|(resource, amount)| (*resource, *amount))
    }

    pub fn resources(&self) -> impl Iterator<Item = Resource> + '_ {
        self.0.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<(Resource, u64)> for ResourceCost {
    fn from_iter<I: IntoIterator<Item = (Resource, u64)>>(iter: I) -> Self {
        let mut cost = ResourceCost::new();
        for (resource, amount) in iter {
            cost.add(resource, amount);
        }
        cost
    }
}
