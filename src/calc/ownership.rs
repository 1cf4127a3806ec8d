use std::collections::BTreeMap;

use serde::Serialize;

use crate::calc::aggregate::AggregateCost;
use crate::calc::resource::{Resource, ResourceCost};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Balance {
    /// `owned - required`; negative means a shortfall.
    pub surplus: i64,
    pub sufficient: bool,
}

/// Compare required totals against owned quantities, one entry per resource
/// present in `required.sum`. Resources missing from `owned` count as zero.
pub fn compare(required: &AggregateCost, owned: &ResourceCost) -> BTreeMap<Resource, Balance> {
    compare_totals(&required.sum, owned)
}

pub fn compare_totals(required: &ResourceCost, owned: &ResourceCost) -> BTreeMap<Resource, Balance> {
    required
        .iter()
        .map(|(resource, needed)| {
            let diff = i128::from(owned.get(resource)) - i128::from(needed);
            let surplus = i64::try_from(diff).unwrap_or(if diff < 0 { i64::MIN } else { i64::MAX });
            (
                resource,
                Balance {
                    surplus,
                    sufficient: diff >= 0,
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_surplus_and_deficit_per_resource() {
        let required = AggregateCost {
            sum: [
                (Resource::HardenedAlloy, 12),
                (Resource::PolishingSolution, 7),
                (Resource::DesignPlans, 7),
            ]
            .into_iter()
            .collect(),
            ..AggregateCost::empty()
        };
        let owned: ResourceCost = [
            (Resource::HardenedAlloy, 10),
            (Resource::PolishingSolution, 20),
            (Resource::DesignPlans, 0),
        ]
        .into_iter()
        .collect();

        let result = compare(&required, &owned);

        assert_eq!(
            result[&Resource::HardenedAlloy],
            Balance { surplus: -2, sufficient: false }
        );
        assert_eq!(
            result[&Resource::PolishingSolution],
            Balance { surplus: 13, sufficient: true }
        );
        assert_eq!(
            result[&Resource::DesignPlans],
            Balance { surplus: -7, sufficient: false }
        );
    }

    #[test]
    fn missing_owned_counts_as_zero_and_extras_are_ignored() {
        let required: ResourceCost = [(Resource::Secrets, 4), (Resource::Guides, 0)]
            .into_iter()
            .collect();
        let owned: ResourceCost = [(Resource::LunarAmber, 99)].into_iter().collect();

        let result = compare_totals(&required, &owned);

        assert_eq!(result.len(), 2);
        assert_eq!(result[&Resource::Secrets], Balance { surplus: -4, sufficient: false });
        assert_eq!(result[&Resource::Guides], Balance { surplus: 0, sufficient: true });
        assert!(!result.contains_key(&Resource::LunarAmber));
    }
}
