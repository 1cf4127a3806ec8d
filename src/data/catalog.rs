//! Startup-loaded table catalog.
//! Load once, share via Arc with the server and CLI; tables never change afterwards.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use tracing::warn;

use crate::calc::error::CostError;
use crate::calc::session::CalculatorSession;
use crate::data::progression::{load_progression_dir, LoadError, LoadedTable};

/// Read-only registry of progression tables keyed by id.
#[derive(Debug, Default)]
pub struct Catalog {
    tables: BTreeMap<String, LoadedTable>,
}

impl Catalog {
    /// A catalog with nothing loaded; every lookup reports `TableNotLoaded`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load all table files from `dir`. A malformed table is fatal.
    pub fn load(dir: &Path) -> Result<Arc<Catalog>, LoadError> {
        let tables = load_progression_dir(dir)?;
        Ok(Arc::new(Self::from_tables(tables)))
    }

    /// Later tables replace earlier ones with the same id.
    pub fn from_tables(tables: Vec<LoadedTable>) -> Self {
        let mut catalog = Self::empty();
        for table in tables {
            catalog.insert(table);
        }
        catalog
    }

    pub fn insert(&mut self, loaded: LoadedTable) {
        let id = loaded.table.id().to_string();
        if self.tables.contains_key(&id) {
            warn!(table = id.as_str(), "duplicate table id; keeping the last one loaded");
        }
        self.tables.insert(id, loaded);
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn tables(&self) -> impl Iterator<Item = &LoadedTable> {
        self.tables.values()
    }

    pub fn table(&self, id: &str) -> Result<&LoadedTable, CostError> {
        self.tables
            .get(id)
            .ok_or_else(|| CostError::TableNotLoaded(id.to_string()))
    }

    /// Fresh calculator session over the table's slot layout.
    pub fn session(&self, id: &str) -> Result<CalculatorSession, CostError> {
        let loaded = self.table(id)?;
        Ok(CalculatorSession::new(
            Arc::clone(&loaded.table),
            &loaded.slots,
        ))
    }
}
