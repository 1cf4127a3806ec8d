use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::calc::aggregate::{aggregate, SkippedRange};
use crate::calc::error::CostError;
use crate::calc::key::LevelKey;
use crate::calc::ownership::{compare, compare_totals, Balance};
use crate::calc::plan::SlotSpec;
use crate::calc::resolver::UpgradeRange;
use crate::calc::resource::{Resource, ResourceCost};
use crate::calc::session::SlotCost;
use crate::calc::table::{KeyScheme, StatKind};
use crate::config::AppConfig;
use crate::data::catalog::Catalog;
use crate::data::inventory::{load_inventory, save_inventory};
use crate::data::progression::LoadedTable;
use crate::data::selections::{load_selections, save_selections, SavedSelections};
use crate::format::format_power;

/// Shared, read-only state handed to every request.
#[derive(Debug, Clone)]
pub struct ServerContext {
    pub catalog: Arc<Catalog>,
    pub inventory_path: PathBuf,
    pub selections_dir: PathBuf,
}

impl ServerContext {
    pub fn new(catalog: Arc<Catalog>, config: &AppConfig) -> Self {
        Self {
            catalog,
            inventory_path: config.inventory_path.clone(),
            selections_dir: config.selections_dir.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    pub field: &'static str,
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationErrorResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub errors: Vec<ValidationIssue>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request body: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{0}")]
    Cost(#[from] CostError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Validation failed")]
    Validation(Vec<ValidationIssue>),
}

pub fn health_payload(ctx: &ServerContext) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&serde_json::json!({
        "status": "ok",
        "service": "frostforge-api",
        "version": env!("CARGO_PKG_VERSION"),
        "tables_loaded": ctx.catalog.len(),
    }))
}

#[derive(Debug, Clone, Serialize)]
pub struct TableSummary {
    pub id: String,
    pub name: String,
    pub key_scheme: KeyScheme,
    pub stat: StatKind,
    pub levels: usize,
    pub slots: usize,
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_note: Option<String>,
}

fn summarize(loaded: &LoadedTable) -> TableSummary {
    let mut categories: Vec<String> = Vec::new();
    for slot in &loaded.slots {
        if !categories.contains(&slot.category) {
            categories.push(slot.category.clone());
        }
    }
    TableSummary {
        id: loaded.table.id().to_string(),
        name: loaded.table.name().to_string(),
        key_scheme: loaded.table.key_scheme(),
        stat: loaded.table.stat(),
        levels: loaded.table.len(),
        slots: loaded.slots.len(),
        categories,
        data_version: loaded.data_version.clone(),
        source_note: loaded.source_note.clone(),
    }
}

pub fn tables_payload(ctx: &ServerContext) -> Result<String, serde_json::Error> {
    let list: Vec<TableSummary> = ctx.catalog.tables().map(summarize).collect();
    serde_json::to_string_pretty(&serde_json::json!({ "tables": list }))
}

#[derive(Debug, Clone, Serialize)]
pub struct LevelView {
    pub ordinal: u32,
    pub key: LevelKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub power: f64,
    pub power_display: String,
    pub cost: ResourceCost,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableDetail {
    #[serde(flatten)]
    pub summary: TableSummary,
    pub slot_layout: Vec<SlotSpec>,
    pub level_list: Vec<LevelView>,
}

pub fn table_detail_payload(ctx: &ServerContext, id: &str) -> Result<String, ApiError> {
    let loaded = ctx.catalog.table(id)?;
    let stat = loaded.table.stat();
    let detail = TableDetail {
        summary: summarize(loaded),
        slot_layout: loaded.slots.clone(),
        level_list: loaded
            .table
            .levels()
            .iter()
            .map(|level| LevelView {
                ordinal: level.ordinal,
                key: level.key(),
                label: level.label.clone(),
                power: level.power,
                power_display: format_power(level.power, stat),
                cost: level.cost.clone(),
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&detail)?)
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkSelection {
    pub category: String,
    #[serde(default = "LevelKey::unset")]
    pub from: LevelKey,
    #[serde(default = "LevelKey::unset")]
    pub to: LevelKey,
}

/// Either ad hoc `ranges`, or slot mode: `bulk` is applied first (in order),
/// then individual `slots` override. Keys that are missing or not level keys
/// are accepted here and reported per range in `skipped`.
#[derive(Debug, Clone, Deserialize)]
pub struct CostRequest {
    pub table: String,
    #[serde(default)]
    pub ranges: Vec<UpgradeRange>,
    #[serde(default)]
    pub slots: BTreeMap<String, UpgradeRange>,
    #[serde(default)]
    pub bulk: Vec<BulkSelection>,
    #[serde(default)]
    pub owned: Option<ResourceCost>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CostResponse {
    pub status: &'static str,
    pub table: String,
    pub stat: StatKind,
    pub sum: ResourceCost,
    pub final_power: Option<f64>,
    pub final_power_display: Option<String>,
    pub contributing_ranges: usize,
    pub skipped: Vec<SkippedRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<Vec<SlotCost>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<BTreeMap<Resource, Balance>>,
}

pub fn cost_payload(ctx: &ServerContext, body: &str) -> Result<String, ApiError> {
    let request: CostRequest = serde_json::from_str(body)?;
    let mut session = ctx.catalog.session(&request.table)?;
    let mut errors: Vec<ValidationIssue> = Vec::new();

    let slot_mode = !request.slots.is_empty() || !request.bulk.is_empty();
    if !request.ranges.is_empty() && slot_mode {
        errors.push(ValidationIssue {
            field: "ranges",
            messages: vec!["provide either 'ranges' or 'slots'/'bulk', not both".to_string()],
        });
    }

    let categories: Vec<String> = session
        .plan()
        .categories()
        .into_iter()
        .map(str::to_string)
        .collect();
    let unknown_categories: Vec<String> = request
        .bulk
        .iter()
        .filter(|bulk| {
            !categories
                .iter()
                .any(|category| category.eq_ignore_ascii_case(bulk.category.trim()))
        })
        .map(|bulk| format!("unknown category '{}'", bulk.category))
        .collect();
    if !unknown_categories.is_empty() {
        errors.push(ValidationIssue {
            field: "bulk",
            messages: unknown_categories,
        });
    }

    let unknown_slots: Vec<String> = request
        .slots
        .keys()
        .filter(|slot_id| session.plan().slot(slot_id).is_none())
        .map(|slot_id| format!("unknown slot '{slot_id}'"))
        .collect();
    if !unknown_slots.is_empty() {
        errors.push(ValidationIssue {
            field: "slots",
            messages: unknown_slots,
        });
    }

    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let (total, breakdown) = if slot_mode {
        for bulk in &request.bulk {
            session.apply_bulk(&bulk.category, &bulk.from, &bulk.to);
        }
        session.restore(&request.slots);
        (session.recompute(), Some(session.breakdown()))
    } else {
        (aggregate(session.table(), &request.ranges), None)
    };

    let stat = session.table().stat();
    let comparison = request.owned.as_ref().map(|owned| compare(&total, owned));
    let response = CostResponse {
        status: "ok",
        table: request.table,
        stat,
        final_power_display: total.final_power.map(|power| format_power(power, stat)),
        final_power: total.final_power,
        contributing_ranges: total.contributing_ranges,
        skipped: total.skipped,
        sum: total.sum,
        breakdown,
        comparison,
    };
    Ok(serde_json::to_string_pretty(&response)?)
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompareRequest {
    pub required: ResourceCost,
    #[serde(default)]
    pub owned: Option<ResourceCost>,
}

/// Without `owned` in the body the saved inventory is used.
pub fn compare_payload(ctx: &ServerContext, body: &str) -> Result<String, ApiError> {
    let request: CompareRequest = serde_json::from_str(body)?;
    let owned = request
        .owned
        .unwrap_or_else(|| load_inventory(&ctx.inventory_path));
    let comparison = compare_totals(&request.required, &owned);
    Ok(serde_json::to_string_pretty(&serde_json::json!({
        "status": "ok",
        "comparison": comparison,
    }))?)
}

pub fn inventory_get_payload(ctx: &ServerContext) -> Result<String, serde_json::Error> {
    let owned = load_inventory(&ctx.inventory_path);
    serde_json::to_string_pretty(&serde_json::json!({ "owned": owned }))
}

pub fn inventory_put_payload(ctx: &ServerContext, body: &str) -> Result<String, ApiError> {
    let owned: ResourceCost = serde_json::from_str(body)?;
    save_inventory(&ctx.inventory_path, &owned)?;
    info!(resources = owned.len(), "inventory saved");
    Ok(serde_json::to_string_pretty(&serde_json::json!({
        "status": "ok",
        "owned": owned,
    }))?)
}

pub fn selections_get_payload(ctx: &ServerContext, table_id: &str) -> Result<String, ApiError> {
    ctx.catalog.table(table_id)?;
    let saved = load_selections(&ctx.selections_dir, table_id);
    Ok(serde_json::to_string_pretty(&saved)?)
}

#[derive(Debug, Clone, Deserialize)]
struct SelectionsBody {
    #[serde(default)]
    slots: BTreeMap<String, UpgradeRange>,
}

/// Replace the saved selections of a table. Keys are stored even if they do
/// not resolve yet; slot ids must exist in the layout.
pub fn selections_put_payload(
    ctx: &ServerContext,
    table_id: &str,
    body: &str,
) -> Result<String, ApiError> {
    let loaded = ctx.catalog.table(table_id)?;
    let request: SelectionsBody = serde_json::from_str(body)?;

    let unknown: Vec<String> = request
        .slots
        .keys()
        .filter(|slot_id| !loaded.slots.iter().any(|slot| &slot.id == *slot_id))
        .map(|slot_id| format!("unknown slot '{slot_id}'"))
        .collect();
    if !unknown.is_empty() {
        return Err(ApiError::Validation(vec![ValidationIssue {
            field: "slots",
            messages: unknown,
        }]));
    }

    let saved: SavedSelections = save_selections(&ctx.selections_dir, table_id, request.slots)?;
    info!(table = table_id, slots = saved.slots.len(), "selections saved");
    Ok(serde_json::to_string_pretty(&saved)?)
}
