pub mod aggregate;
pub mod error;
pub mod export_csv;
pub mod key;
pub mod ownership;
pub mod plan;
pub mod resolver;
pub mod resource;
pub mod session;
pub mod table;
pub mod validate;

pub use aggregate::{aggregate, AggregateCost, SkipReason, SkippedRange};
pub use error::CostError;
pub use export_csv::breakdown_to_csv;
pub use key::{KeyResolver, LevelKey, OrdinalLookup, TierStar, TierStarLookup};
pub use ownership::{compare, compare_totals, Balance};
pub use plan::{Slot, SlotSpec, UpgradePlan};
pub use resolver::{resolve, RangeCost, UpgradeRange};
pub use resource::{Resource, ResourceCost};
pub use session::{CalculatorSession, SlotCost, SlotOutcome};
pub use table::{KeyScheme, Level, LevelRecord, ProgressionTable, StatKind, TableMeta};
pub use validate::{check_level_records, ValidationReport, ValidationSeverity};
