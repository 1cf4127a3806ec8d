//! Progression table files (JSON or YAML) and directory loading.
//! One file per calculator; see data/progression/ for the bundled tables.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::calc::error::CostError;
use crate::calc::plan::SlotSpec;
use crate::calc::table::{KeyScheme, LevelRecord, ProgressionTable, StatKind, TableMeta};

pub const DEFAULT_PROGRESSION_DIR: &str = "data/progression";

/// On-disk table format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressionFile {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub data_version: Option<String>,
    #[serde(default)]
    pub source_note: Option<String>,
    #[serde(default)]
    pub key_scheme: KeyScheme,
    #[serde(default)]
    pub stat: StatKind,
    #[serde(default)]
    pub tiers: Vec<String>,
    #[serde(default)]
    pub slots: Vec<SlotSpec>,
    pub levels: Vec<LevelRecord>,
}

impl ProgressionFile {
    pub fn meta(&self) -> TableMeta {
        TableMeta {
            id: self.id.clone(),
            name: self.name.clone().unwrap_or_else(|| self.id.clone()),
            key_scheme: self.key_scheme,
            stat: self.stat,
            tiers: self.tiers.clone(),
        }
    }

    pub fn into_loaded(self) -> Result<LoadedTable, CostError> {
        let table = ProgressionTable::from_records(self.meta(), &self.levels)?;
        Ok(LoadedTable {
            table: Arc::new(table),
            slots: self.slots,
            data_version: self.data_version,
            source_note: self.source_note,
        })
    }
}

/// A validated table plus its slot layout and provenance.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub table: Arc<ProgressionTable>,
    pub slots: Vec<SlotSpec>,
    pub data_version: Option<String>,
    pub source_note: Option<String>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse '{path}': {message}")]
    Parse { path: PathBuf, message: String },

    #[error("'{path}': {source}")]
    Table {
        path: PathBuf,
        #[source]
        source: CostError,
    },
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    )
}

fn is_table_file(path: &Path) -> bool {
    is_yaml(path) || path.extension().and_then(|ext| ext.to_str()) == Some("json")
}

/// Parse a table file without validating it. `.yaml`/`.yml` go through
/// serde_yaml, everything else through serde_json.
pub fn parse_progression_file(path: &Path) -> Result<ProgressionFile, LoadError> {
    let raw = fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed = if is_yaml(path) {
        serde_yaml::from_str(&raw).map_err(|err| err.to_string())
    } else {
        serde_json::from_str(&raw).map_err(|err| err.to_string())
    };
    parsed.map_err(|message| LoadError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

pub fn load_progression_file(path: &Path) -> Result<LoadedTable, LoadError> {
    let file = parse_progression_file(path)?;
    let loaded = file.into_loaded().map_err(|source| LoadError::Table {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(
        table = loaded.table.id(),
        levels = loaded.table.len(),
        slots = loaded.slots.len(),
        "loaded progression table from {}",
        path.display()
    );
    Ok(loaded)
}

/// `.json`, `.yaml` and `.yml` files directly inside `dir`, sorted by name.
pub fn progression_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let entries = fs::read_dir(dir).map_err(|source| LoadError::Read {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_table_file(path))
        .collect();
    paths.sort();
    Ok(paths)
}

/// Load every table file in `dir`, in file-name order. One bad file fails the
/// whole load.
pub fn load_progression_dir(dir: &Path) -> Result<Vec<LoadedTable>, LoadError> {
    let paths = progression_files(dir)?;
    let tables = paths
        .iter()
        .map(|path| load_progression_file(path))
        .collect::<Result<Vec<_>, _>>()?;
    info!(count = tables.len(), "loaded progression tables from {}", dir.display());
    Ok(tables)
}
