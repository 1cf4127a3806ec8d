use std::collections::HashSet;
use std::path::Path;

use crate::calc::plan::SlotSpec;
use crate::data::progression::parse_progression_file;

pub use crate::calc::validate::{
    check_level_records, ValidationDiagnostic, ValidationReport, ValidationSeverity,
};

/// Slot layout checks: unique ids and non-empty categories.
pub fn check_slot_layout(slots: &[SlotSpec]) -> ValidationReport {
    let mut report = ValidationReport::default();
    if slots.is_empty() {
        report.push(
            ValidationSeverity::Warning,
            "slots",
            "no slot layout; only ad hoc ranges can be costed",
        );
        return report;
    }

    let mut seen = HashSet::new();
    for (index, slot) in slots.iter().enumerate() {
        let context = format!("slots[{index}]");
        if slot.id.trim().is_empty() {
            report.push(
                ValidationSeverity::Error,
                format!("{context}.id"),
                "missing non-empty 'id'",
            );
        } else if !seen.insert(slot.id.as_str()) {
            report.push(
                ValidationSeverity::Error,
                format!("{context}.id"),
                format!("duplicate slot id '{}'", slot.id),
            );
        }
        if slot.category.trim().is_empty() {
            report.push(
                ValidationSeverity::Warning,
                format!("{context}.category"),
                "empty category; bulk selection cannot reach this slot",
            );
        }
    }
    report
}

/// Validate a progression data file without loading it into a catalog.
pub fn validate_progression_file(path: &Path) -> Result<ValidationReport, String> {
    let file = parse_progression_file(path).map_err(|err| err.to_string())?;
    let mut report = check_level_records(&file.meta(), &file.levels);
    report
        .diagnostics
        .extend(check_slot_layout(&file.slots).diagnostics);
    Ok(report)
}
