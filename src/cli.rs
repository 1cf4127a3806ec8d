use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::calc::aggregate::{AggregateCost, SkipReason};
use crate::calc::export_csv::breakdown_to_csv;
use crate::calc::key::LevelKey;
use crate::calc::ownership::{compare, Balance};
use crate::calc::plan::SlotSpec;
use crate::calc::resolver::UpgradeRange;
use crate::calc::resource::Resource;
use crate::calc::session::{CalculatorSession, SlotCost};
use crate::calc::table::{ProgressionTable, StatKind};
use crate::config::AppConfig;
use crate::data::catalog::Catalog;
use crate::data::inventory::load_inventory;
use crate::data::progression::progression_files;
use crate::data::selections::{load_selections, save_selections};
use crate::data::validate::{validate_progression_file, ValidationSeverity};
use crate::format::{format_amount, format_power, format_signed};
use crate::server;

const USAGE: &str = "usage: frostforge <serve|tables|cost|validate>";
const COST_USAGE: &str = "usage: frostforge cost <table> [FROM..TO ...] [--slot ID=FROM..TO] \
[--bulk CATEGORY=FROM..TO] [--owned PATH] [--have RESOURCE=AMOUNT] [--save] [--json|--csv]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Serve,
    Tables,
    Cost,
    Validate,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("serve") => Some(Command::Serve),
        Some("tables") => Some(Command::Tables),
        Some("cost") => Some(Command::Cost),
        Some("validate") => Some(Command::Validate),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    let config = AppConfig::from_env();
    match parse_command(args) {
        Some(Command::Serve) => handle_serve(&config),
        Some(Command::Tables) => handle_tables(&config),
        Some(Command::Cost) => handle_cost(args, &config),
        Some(Command::Validate) => handle_validate(args, &config),
        None => {
            eprintln!("{USAGE}");
            2
        }
    }
}

fn handle_serve(config: &AppConfig) -> i32 {
    match server::run_server(config) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("server error: {err}");
            1
        }
    }
}

fn load_catalog(config: &AppConfig) -> Option<Arc<Catalog>> {
    match Catalog::load(&config.data_dir) {
        Ok(catalog) => Some(catalog),
        Err(err) => {
            eprintln!("failed to load progression tables: {err}");
            None
        }
    }
}

fn handle_tables(config: &AppConfig) -> i32 {
    let Some(catalog) = load_catalog(config) else {
        return 1;
    };
    if catalog.is_empty() {
        println!("no progression tables in {}", config.data_dir.display());
        return 0;
    }
    println!("id\tlevels\tslots\tname");
    for loaded in catalog.tables() {
        println!(
            "{}\t{}\t{}\t{}",
            loaded.table.id(),
            loaded.table.len(),
            loaded.slots.len(),
            loaded.table.name()
        );
    }
    0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
    Csv,
}

#[derive(Debug, Clone, PartialEq)]
struct CostArgs {
    table: String,
    ranges: Vec<UpgradeRange>,
    slots: BTreeMap<String, UpgradeRange>,
    bulk: Vec<(String, UpgradeRange)>,
    owned: Option<PathBuf>,
    have: Vec<(Resource, u64)>,
    save: bool,
    format: OutputFormat,
}

impl CostArgs {
    fn slot_mode(&self) -> bool {
        !self.slots.is_empty() || !self.bulk.is_empty()
    }
}

/// `FROM..TO`, each side an ordinal or `TIER:STAR`.
fn parse_range(raw: &str) -> Result<UpgradeRange, String> {
    let Some((from, to)) = raw.split_once("..") else {
        return Err(format!("range '{raw}' must look like FROM..TO"));
    };
    Ok(UpgradeRange::new(
        from.parse::<LevelKey>()?,
        to.parse::<LevelKey>()?,
    ))
}

fn parse_assignment(raw: &str, flag: &str) -> Result<(String, UpgradeRange), String> {
    let Some((name, range)) = raw.split_once('=') else {
        return Err(format!("{flag} expects NAME=FROM..TO, got '{raw}'"));
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("{flag} has an empty name in '{raw}'"));
    }
    Ok((name.to_string(), parse_range(range)?))
}

fn parse_have(raw: &str) -> Result<(Resource, u64), String> {
    let Some((name, amount)) = raw.split_once('=') else {
        return Err(format!("--have expects RESOURCE=AMOUNT, got '{raw}'"));
    };
    let resource = name.parse::<Resource>()?;
    let amount = amount
        .trim()
        .replace(',', "")
        .parse::<u64>()
        .map_err(|err| format!("invalid amount in '{raw}': {err}"))?;
    Ok((resource, amount))
}

fn parse_cost_args(args: &[String]) -> Result<CostArgs, String> {
    let mut rest = args.iter().skip(2);
    let Some(table) = rest.next().filter(|arg| !arg.starts_with("--")) else {
        return Err("missing table id".to_string());
    };
    let mut parsed = CostArgs {
        table: table.clone(),
        ranges: Vec::new(),
        slots: BTreeMap::new(),
        bulk: Vec::new(),
        owned: None,
        have: Vec::new(),
        save: false,
        format: OutputFormat::Text,
    };

    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--json" => parsed.format = OutputFormat::Json,
            "--csv" => parsed.format = OutputFormat::Csv,
            "--save" => parsed.save = true,
            "--owned" => {
                let path = rest.next().ok_or("--owned expects a path")?;
                parsed.owned = Some(PathBuf::from(path));
            }
            "--have" => {
                let raw = rest.next().ok_or("--have expects RESOURCE=AMOUNT")?;
                parsed.have.push(parse_have(raw)?);
            }
            "--slot" => {
                let raw = rest.next().ok_or("--slot expects ID=FROM..TO")?;
                let (slot_id, range) = parse_assignment(raw, "--slot")?;
                parsed.slots.insert(slot_id, range);
            }
            "--bulk" => {
                let raw = rest.next().ok_or("--bulk expects CATEGORY=FROM..TO")?;
                parsed.bulk.push(parse_assignment(raw, "--bulk")?);
            }
            flag if flag.starts_with("--") => return Err(format!("unknown option '{flag}'")),
            range => parsed.ranges.push(parse_range(range)?),
        }
    }

    if !parsed.ranges.is_empty() && parsed.slot_mode() {
        return Err("positional ranges cannot be combined with --slot/--bulk".to_string());
    }
    if parsed.save && !parsed.ranges.is_empty() {
        return Err("--save only applies to slot selections".to_string());
    }
    Ok(parsed)
}

/// Positional ranges are evaluated as anonymous slots so the breakdown and CSV
/// paths are shared with slot mode.
fn ad_hoc_session(table: Arc<ProgressionTable>, ranges: &[UpgradeRange]) -> CalculatorSession {
    let layout: Vec<SlotSpec> = (1..=ranges.len())
        .map(|index| SlotSpec::new(format!("range-{index}"), "ad-hoc"))
        .collect();
    let mut ad_hoc = CalculatorSession::new(table, &layout);
    for (spec, range) in layout.iter().zip(ranges) {
        ad_hoc.select(&spec.id, Some(range.clone()));
    }
    ad_hoc
}

#[derive(Debug, Serialize)]
struct CostReport<'a> {
    table: &'a str,
    stat: StatKind,
    #[serde(flatten)]
    total: &'a AggregateCost,
    breakdown: &'a [SlotCost],
    #[serde(skip_serializing_if = "Option::is_none")]
    comparison: Option<&'a BTreeMap<Resource, Balance>>,
}

fn handle_cost(args: &[String], config: &AppConfig) -> i32 {
    let cost_args = match parse_cost_args(args) {
        Ok(parsed) => parsed,
        Err(msg) => {
            eprintln!("{msg}");
            eprintln!("{COST_USAGE}");
            return 2;
        }
    };
    let Some(catalog) = load_catalog(config) else {
        return 1;
    };
    let loaded = match catalog.table(&cost_args.table) {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };

    let mut session = if cost_args.ranges.is_empty() {
        CalculatorSession::new(Arc::clone(&loaded.table), &loaded.slots)
    } else {
        ad_hoc_session(Arc::clone(&loaded.table), &cost_args.ranges)
    };
    if cost_args.slot_mode() {
        for (category, range) in &cost_args.bulk {
            let known = session
                .plan()
                .categories()
                .iter()
                .any(|known| known.eq_ignore_ascii_case(category));
            if !known {
                eprintln!("unknown category '{category}' for '{}'", cost_args.table);
                return 2;
            }
            session.apply_bulk(category, &range.from, &range.to);
        }
        let unknown = session.restore(&cost_args.slots);
        if !unknown.is_empty() {
            eprintln!("unknown slot(s) for '{}': {}", cost_args.table, unknown.join(", "));
            return 2;
        }
    } else if cost_args.ranges.is_empty() {
        let saved = load_selections(&config.selections_dir, &cost_args.table);
        for slot_id in session.restore(&saved.slots) {
            warn!(table = %cost_args.table, slot = %slot_id, "saved selection for unknown slot ignored");
        }
    }

    if cost_args.save {
        if let Err(err) = save_selections(&config.selections_dir, &cost_args.table, session.selections()) {
            eprintln!("failed to save selections: {err}");
            return 1;
        }
    }

    let total = session.recompute();
    let breakdown = session.breakdown();
    let comparison = if cost_args.owned.is_some() || !cost_args.have.is_empty() {
        let mut owned = cost_args
            .owned
            .as_deref()
            .map(load_inventory)
            .unwrap_or_default();
        for (resource, amount) in &cost_args.have {
            owned.set(*resource, *amount);
        }
        Some(compare(&total, &owned))
    } else {
        None
    };
    let stat = session.table().stat();

    match cost_args.format {
        OutputFormat::Json => {
            let report = CostReport {
                table: &cost_args.table,
                stat,
                total: &total,
                breakdown: &breakdown,
                comparison: comparison.as_ref(),
            };
            match serde_json::to_string_pretty(&report) {
                Ok(payload) => println!("{payload}"),
                Err(err) => {
                    eprintln!("failed to serialize cost report: {err}");
                    return 1;
                }
            }
        }
        OutputFormat::Csv => match breakdown_to_csv(&breakdown, &total) {
            Ok(csv) => print!("{csv}"),
            Err(err) => {
                eprintln!("failed to write csv: {err}");
                return 1;
            }
        },
        OutputFormat::Text => {
            print!(
                "{}",
                render_text(session.table().name(), stat, &total, comparison.as_ref())
            );
        }
    }
    0
}

fn render_text(
    name: &str,
    stat: StatKind,
    total: &AggregateCost,
    comparison: Option<&BTreeMap<Resource, Balance>>,
) -> String {
    let mut out = format!(
        "{name}: {} range(s) costed, {} skipped\n",
        total.contributing_ranges,
        total.skipped.len()
    );
    for (resource, amount) in total.sum.iter() {
        out.push_str(&format!("  {:<20}{:>14}\n", resource.label(), format_amount(amount)));
    }
    match total.final_power {
        Some(power) => out.push_str(&format!("power: {}\n", format_power(power, stat))),
        None => out.push_str("power: -\n"),
    }
    for skipped in &total.skipped {
        let reason = match &skipped.reason {
            SkipReason::NonIncreasing => "from is not below to".to_string(),
            SkipReason::UnknownKey { message } | SkipReason::MalformedKey { message } => {
                message.clone()
            }
        };
        out.push_str(&format!("  skipped #{}: {reason}\n", skipped.index + 1));
    }
    if let Some(comparison) = comparison {
        out.push_str("owned vs required:\n");
        for (resource, balance) in comparison {
            out.push_str(&format!(
                "  {:<20}{:>14}  {}\n",
                resource.label(),
                format_signed(balance.surplus),
                if balance.sufficient { "ok" } else { "short" }
            ));
        }
    }
    out
}

fn handle_validate(args: &[String], config: &AppConfig) -> i32 {
    let paths: Vec<PathBuf> = if args.len() > 2 {
        args[2..].iter().map(PathBuf::from).collect()
    } else {
        match progression_files(&config.data_dir) {
            Ok(files) => files,
            Err(err) => {
                eprintln!("{err}");
                return 1;
            }
        }
    };
    if paths.is_empty() {
        eprintln!("no progression files to validate");
        return 1;
    }

    let mut failed = 0_usize;
    for path in &paths {
        match validate_progression_file(path) {
            Ok(report) => {
                for diagnostic in &report.diagnostics {
                    println!("{}: {diagnostic}", path.display());
                }
                if report.has_errors() {
                    failed += 1;
                }
                println!(
                    "{}: {} error(s), {} warning(s)",
                    path.display(),
                    report.count(ValidationSeverity::Error),
                    report.count(ValidationSeverity::Warning)
                );
            }
            Err(err) => {
                eprintln!("{}: {err}", path.display());
                failed += 1;
            }
        }
    }

    if failed == 0 {
        println!("validation passed: {} file(s)", paths.len());
        0
    } else {
        eprintln!("validation failed: {failed} of {} file(s)", paths.len());
        1
    }
}
