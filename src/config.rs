//! Runtime configuration from environment variables.
//!
//! | variable                    | default              |
//! |-----------------------------|----------------------|
//! | `FROSTFORGE_BIND`           | `127.0.0.1:3000`     |
//! | `FROSTFORGE_DATA_DIR`       | `data/progression`   |
//! | `FROSTFORGE_INVENTORY`      | `data/inventory.json`|
//! | `FROSTFORGE_SELECTIONS_DIR` | `data/selections`    |
//!
//! Log filtering is separate and follows `RUST_LOG`.

use std::path::PathBuf;

use crate::data::inventory::DEFAULT_INVENTORY_PATH;
use crate::data::progression::DEFAULT_PROGRESSION_DIR;
use crate::data::selections::DEFAULT_SELECTIONS_DIR;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: String,
    pub data_dir: PathBuf,
    pub inventory_path: PathBuf,
    pub selections_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source; blank values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str, default: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        Self {
            bind_addr: get("FROSTFORGE_BIND", DEFAULT_BIND_ADDR),
            data_dir: PathBuf::from(get("FROSTFORGE_DATA_DIR", DEFAULT_PROGRESSION_DIR)),
            inventory_path: PathBuf::from(get("FROSTFORGE_INVENTORY", DEFAULT_INVENTORY_PATH)),
            selections_dir: PathBuf::from(get("FROSTFORGE_SELECTIONS_DIR", DEFAULT_SELECTIONS_DIR)),
        }
    }
}
