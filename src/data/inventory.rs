//! Owned resource quantities, persisted as a flat JSON object
//! (`{"hardenedAlloy": 1200, "guides": 40}`).

use std::fs;
use std::path::Path;

use tracing::warn;

use crate::calc::resource::ResourceCost;

pub const DEFAULT_INVENTORY_PATH: &str = "data/inventory.json";

/// Load owned quantities. Returns an empty inventory if the file is missing or invalid.
pub fn load_inventory(path: &Path) -> ResourceCost {
    if !path.exists() {
        return ResourceCost::default();
    }
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            warn!("unable to read inventory '{}': {err}", path.display());
            return ResourceCost::default();
        }
    };
    serde_json::from_str(&raw).unwrap_or_else(|err| {
        warn!("ignoring invalid inventory '{}': {err}", path.display());
        ResourceCost::default()
    })
}

pub fn save_inventory(path: &Path, owned: &ResourceCost) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let raw = serde_json::to_string_pretty(owned).map_err(std::io::Error::other)?;
    fs::write(path, raw)
}
