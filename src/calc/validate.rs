//! Diagnostics over raw level records, collected rather than failing fast.

use std::collections::HashSet;
use std::fmt;

use crate::calc::key::normalize_tier;
use crate::calc::table::{KeyScheme, LevelRecord, TableMeta};

/// Largest amount a cost column may hold and still round-trip through f64.
const MAX_EXACT_AMOUNT: f64 = 9_007_199_254_740_992.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValidationSeverity {
    Error,
    Warning,
    Info,
}

impl ValidationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDiagnostic {
    pub severity: ValidationSeverity,
    pub context: String,
    pub message: String,
}

impl fmt::Display for ValidationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.context, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    pub fn push(
        &mut self,
        severity: ValidationSeverity,
        context: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(ValidationDiagnostic {
            severity,
            context: context.into(),
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity == ValidationSeverity::Error)
    }

    pub fn first_error(&self) -> Option<&ValidationDiagnostic> {
        self.diagnostics
            .iter()
            .find(|diag| diag.severity == ValidationSeverity::Error)
    }

    pub fn count(&self, severity: ValidationSeverity) -> usize {
        self.diagnostics
            .iter()
            .filter(|diag| diag.severity == severity)
            .count()
    }
}

/// Structural checks over raw level records. Shared by the table loader (which
/// stops at the first error) and the offline `validate` command.
pub fn check_level_records(meta: &TableMeta, records: &[LevelRecord]) -> ValidationReport {
    let mut report = ValidationReport::default();

    if records.is_empty() {
        report.push(ValidationSeverity::Error, "levels", "table has no levels");
        return report;
    }

    let explicit = records.iter().filter(|r| r.ordinal.is_some()).count();
    if explicit != 0 && explicit != records.len() {
        report.push(
            ValidationSeverity::Error,
            "levels",
            format!(
                "{explicit} of {} levels declare an ordinal; declare it on all or none",
                records.len()
            ),
        );
    }

    let declared_tiers: HashSet<String> = meta.tiers.iter().map(|t| normalize_tier(t)).collect();
    let mut seen_ordinals = HashSet::new();
    let mut seen_keys = HashSet::new();
    let mut previous_ordinal: Option<u32> = None;
    let mut previous_power: Option<f64> = None;

    for (index, record) in records.iter().enumerate() {
        let context = format!("levels[{index}]");
        let ordinal = record.ordinal.unwrap_or(index as u32);

        if !seen_ordinals.insert(ordinal) {
            report.push(
                ValidationSeverity::Error,
                format!("{context}.ordinal"),
                format!("duplicate ordinal {ordinal}"),
            );
        } else if let Some(previous) = previous_ordinal {
            if ordinal <= previous {
                report.push(
                    ValidationSeverity::Error,
                    format!("{context}.ordinal"),
                    format!("ordinal {ordinal} does not increase after {previous}"),
                );
            }
        }
        previous_ordinal = Some(ordinal);

        if !record.power.is_finite() {
            report.push(
                ValidationSeverity::Error,
                format!("{context}.power"),
                "power must be a finite number",
            );
        } else {
            if let Some(previous) = previous_power {
                if record.power < previous {
                    report.push(
                        ValidationSeverity::Error,
                        format!("{context}.power"),
                        format!("power {} decreases from {previous}", record.power),
                    );
                }
            }
            previous_power = Some(record.power);
        }

        for (resource, amount) in &record.cost {
            let cost_context = format!("{context}.cost.{resource}");
            if !amount.is_finite() || *amount < 0.0 {
                report.push(
                    ValidationSeverity::Error,
                    cost_context,
                    format!("amount {amount} must be a non-negative number"),
                );
            } else if amount.fract() != 0.0 {
                report.push(
                    ValidationSeverity::Error,
                    cost_context,
                    format!("amount {amount} must be a whole number"),
                );
            } else if *amount > MAX_EXACT_AMOUNT {
                report.push(
                    ValidationSeverity::Error,
                    cost_context,
                    format!("amount {amount} is too large"),
                );
            }
        }

        match meta.key_scheme {
            KeyScheme::TierStar => {
                check_tier_star(&mut report, &context, record, &declared_tiers, &mut seen_keys)
            }
            KeyScheme::Ordinal => {
                if record.tier.is_some() || record.star.is_some() {
                    report.push(
                        ValidationSeverity::Warning,
                        context.clone(),
                        "tier/star ignored on an ordinal-keyed table",
                    );
                }
            }
        }

        if index == 0 && record.cost.values().any(|amount| *amount > 0.0) {
            report.push(
                ValidationSeverity::Warning,
                format!("{context}.cost"),
                "cost on the first level is never charged",
            );
        } else if index > 0 && record.cost.values().all(|amount| *amount == 0.0) {
            report.push(
                ValidationSeverity::Info,
                format!("{context}.cost"),
                "level has no cost",
            );
        }
    }

    report
}

fn check_tier_star(
    report: &mut ValidationReport,
    context: &str,
    record: &LevelRecord,
    declared_tiers: &HashSet<String>,
    seen_keys: &mut HashSet<(String, u8)>,
) {
    let tier = match record.tier.as_deref().map(str::trim) {
        Some(tier) if !tier.is_empty() => tier,
        _ => {
            report.push(
                ValidationSeverity::Error,
                format!("{context}.tier"),
                "missing non-empty 'tier'",
            );
            return;
        }
    };
    let Some(star) = record.star else {
        report.push(
            ValidationSeverity::Error,
            format!("{context}.star"),
            "missing 'star'",
        );
        return;
    };

    let normalized = normalize_tier(tier);
    if !declared_tiers.is_empty() && !declared_tiers.contains(&normalized) {
        report.push(
            ValidationSeverity::Error,
            format!("{context}.tier"),
            format!("tier '{tier}' is not declared in 'tiers'"),
        );
    }
    if !seen_keys.insert((normalized, star)) {
        report.push(
            ValidationSeverity::Error,
            context.to_string(),
            format!("duplicate key '{tier}:{star}'"),
        );
    }
}
