//! Per-table saved slot selections so a calculator reopens where the user left it.
//! Stored as data/selections/<table>.json; the calc core never touches these files.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::calc::resolver::UpgradeRange;

pub const DEFAULT_SELECTIONS_DIR: &str = "data/selections";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedSelections {
    pub table: String,
    /// RFC 3339 timestamp of the last save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<String>,
    #[serde(default)]
    pub slots: BTreeMap<String, UpgradeRange>,
}

impl SavedSelections {
    pub fn empty(table: &str) -> Self {
        Self {
            table: table.to_string(),
            ..Self::default()
        }
    }
}

fn sanitize_table_id(id: &str) -> String {
    let s: String = id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    if s.is_empty() {
        "unknown".to_string()
    } else {
        s
    }
}

pub fn selections_path(dir: &Path, table_id: &str) -> PathBuf {
    dir.join(format!("{}.json", sanitize_table_id(table_id)))
}

/// On-disk shape with each slot left raw, so one bad entry drops only itself.
#[derive(Debug, Deserialize)]
struct StoredSelections {
    table: String,
    #[serde(default)]
    saved_at: Option<String>,
    #[serde(default)]
    slots: BTreeMap<String, serde_json::Value>,
}

/// Saved selections for `table_id`; empty when nothing usable is on disk.
/// Entries that are not a range at all are dropped with a warning; ranges
/// whose keys do not resolve are kept as written.
pub fn load_selections(dir: &Path, table_id: &str) -> SavedSelections {
    let path = selections_path(dir, table_id);
    let Ok(raw) = fs::read_to_string(&path) else {
        return SavedSelections::empty(table_id);
    };
    let stored = match serde_json::from_str::<StoredSelections>(&raw) {
        Ok(stored) => stored,
        Err(err) => {
            warn!("ignoring invalid selections '{}': {err}", path.display());
            return SavedSelections::empty(table_id);
        }
    };
    if stored.table != table_id {
        warn!(
            "selections '{}' belong to table '{}', not '{table_id}'",
            path.display(),
            stored.table
        );
        return SavedSelections::empty(table_id);
    }

    let mut slots = BTreeMap::new();
    for (slot_id, value) in stored.slots {
        match serde_json::from_value::<UpgradeRange>(value) {
            Ok(range) => {
                slots.insert(slot_id, range);
            }
            Err(err) => warn!("dropping saved slot '{slot_id}' in '{}': {err}", path.display()),
        }
    }
    SavedSelections {
        table: stored.table,
        saved_at: stored.saved_at,
        slots,
    }
}

/// Write selections, stamping `saved_at`. Returns the record as written.
pub fn save_selections(
    dir: &Path,
    table_id: &str,
    slots: BTreeMap<String, UpgradeRange>,
) -> std::io::Result<SavedSelections> {
    fs::create_dir_all(dir)?;
    let saved = SavedSelections {
        table: table_id.to_string(),
        saved_at: Some(chrono::Utc::now().to_rfc3339()),
        slots,
    };
    let raw = serde_json::to_string_pretty(&saved).map_err(std::io::Error::other)?;
    fs::write(selections_path(dir, table_id), raw)?;
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use crate::calc::key::LevelKey;

    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!("frostforge-{name}-{stamp}"))
    }

    #[test]
    fn path_is_sanitized() {
        let path = selections_path(Path::new("sel"), "../chief gear");
        assert_eq!(path, Path::new("sel").join("chiefgear.json"));
    }

    #[test]
    fn save_then_load_keeps_slots() {
        let dir = temp_dir("selections");
        let mut slots = BTreeMap::new();
        slots.insert(
            "hat".to_string(),
            UpgradeRange::new(LevelKey::tier_star("Gold", 0), LevelKey::tier_star("Gold T1", 2)),
        );

        let saved = save_selections(&dir, "chief_gear", slots.clone()).unwrap();
        assert!(saved.saved_at.is_some());

        let loaded = load_selections(&dir, "chief_gear");
        assert_eq!(loaded.slots, slots);
        assert_eq!(loaded.saved_at, saved.saved_at);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn one_bad_entry_does_not_discard_the_rest() {
        let dir = temp_dir("partial");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            selections_path(&dir, "chief_charms"),
            r#"{
                "table": "chief_charms",
                "slots": {
                    "hat-1": { "from": 0, "to": 3 },
                    "hat-2": { "from": null, "to": 4 },
                    "ring-1": 7
                }
            }"#,
        )
        .unwrap();

        let loaded = load_selections(&dir, "chief_charms");
        assert_eq!(loaded.slots.len(), 2);
        assert_eq!(loaded.slots["hat-1"], UpgradeRange::ordinals(0, 3));
        assert_eq!(
            loaded.slots["hat-2"],
            UpgradeRange::new(LevelKey::unset(), LevelKey::Ordinal(4))
        );
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn missing_selections_are_empty() {
        let loaded = load_selections(&temp_dir("none"), "chief_charms");
        assert_eq!(loaded, SavedSelections::empty("chief_charms"));
    }
}
