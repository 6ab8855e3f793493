use std::fmt::Write as _;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::buffs::{
    interpolate_buff_value, AffectsPredicate, BuffDamageRow, BuffDamageTotals, BuffLink,
    BuffLinkSummary, RosterBuffIndex,
};
use crate::config::SheetConfig;
use crate::data::{load_roster, validate_roster_file, ValidationSeverity};
use crate::error::Result;
use crate::parallel::WorkerPool;

const USAGE: &str = "usage: buffsheet <incoming|outgoing|matrix|value|validate> [args] [--table]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Incoming,
    Outgoing,
    Matrix,
    Value,
    Validate,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("incoming") => Some(Command::Incoming),
        Some("outgoing") => Some(Command::Outgoing),
        Some("matrix") => Some(Command::Matrix),
        Some("value") => Some(Command::Value),
        Some("validate") => Some(Command::Validate),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    run_with_config(args, &SheetConfig::from_env())
}

pub fn run_with_config(args: &[String], config: &SheetConfig) -> i32 {
    let as_table = args.iter().any(|arg| arg == "--table");
    // Positional arguments after the command name, flags removed.
    let positional: Vec<&String> = args
        .iter()
        .skip(2)
        .filter(|arg| !arg.starts_with("--"))
        .collect();

    match parse_command(args) {
        Some(Command::Incoming) => {
            handle_listing(Direction::Incoming, &positional, config, as_table)
        }
        Some(Command::Outgoing) => {
            handle_listing(Direction::Outgoing, &positional, config, as_table)
        }
        Some(Command::Matrix) => handle_matrix(&positional, config, as_table),
        Some(Command::Value) => handle_value(&positional, config),
        Some(Command::Validate) => handle_validate(&positional, config),
        None => {
            eprintln!("{USAGE}");
            2
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum Direction {
    Incoming,
    Outgoing,
}

#[derive(Debug, Serialize)]
struct Listing {
    unit: String,
    direction: Direction,
    level: i64,
    entries: Vec<ListingEntry>,
}

#[derive(Debug, Serialize)]
struct ListingEntry {
    #[serde(flatten)]
    summary: BuffLinkSummary,
    rows: Vec<BuffDamageRow>,
}

impl From<&BuffLink<'_>> for ListingEntry {
    fn from(link: &BuffLink<'_>) -> Self {
        Self {
            summary: link.summary(),
            rows: link.damage.buff_rows.clone(),
        }
    }
}

fn handle_listing(
    direction: Direction,
    positional: &[&String],
    config: &SheetConfig,
    as_table: bool,
) -> i32 {
    let Some(name) = positional.first() else {
        eprintln!("usage: buffsheet {} <unit> [level] [--table]", direction_name(direction));
        return 2;
    };
    let level = parse_level_arg(positional.get(1).copied(), config.level);

    let result = load_roster(&config.roster_path).and_then(|roster| {
        let index = RosterBuffIndex::new(&roster, level);
        let links = match direction {
            Direction::Incoming => index.incoming(name)?,
            Direction::Outgoing => index.outgoing(name)?,
        };
        let unit = index.find_unit(name)?.name.clone();
        Ok(Listing {
            unit,
            direction,
            level: index.level(),
            entries: links.iter().map(ListingEntry::from).collect(),
        })
    });

    match result {
        Ok(listing) => {
            if as_table {
                print!("{}", listing_table(&listing));
                0
            } else {
                print_json(&listing)
            }
        }
        Err(err) => {
            error!("{} query failed: {err}", direction_name(direction));
            1
        }
    }
}

fn direction_name(direction: Direction) -> &'static str {
    match direction {
        Direction::Incoming => "incoming",
        Direction::Outgoing => "outgoing",
    }
}

const TABLE_HEADER: &str =
    "unit\tbuffs\tbuffed_melee\tbuffed_range\tbuffed_bonus_melee\tbuffed_bonus_range\ttotal";

fn table_line(out: &mut String, summary: &BuffLinkSummary) {
    let BuffDamageTotals {
        buffed_melee,
        buffed_range,
        buffed_bonus_melee,
        buffed_bonus_range,
        ..
    } = summary.totals;
    let _ = writeln!(
        out,
        "{}\t{}\t{}\t{}\t{}\t{}\t{}",
        summary.unit,
        summary.buffs.join(", "),
        buffed_melee,
        buffed_range,
        buffed_bonus_melee,
        buffed_bonus_range,
        summary.total
    );
}

fn listing_table(listing: &Listing) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{TABLE_HEADER}");
    for entry in &listing.entries {
        table_line(&mut out, &entry.summary);
    }
    out
}

#[derive(Debug, Serialize)]
struct MatrixRow {
    unit: String,
    sources: Vec<BuffLinkSummary>,
}

fn handle_matrix(positional: &[&String], config: &SheetConfig, as_table: bool) -> i32 {
    let level = parse_level_arg(positional.first().copied(), config.level);
    let roster = match load_roster(&config.roster_path) {
        Ok(roster) => roster,
        Err(err) => {
            error!("matrix query failed: {err}");
            return 1;
        }
    };

    let index = RosterBuffIndex::new(&roster, level);
    let rows: Vec<MatrixRow> = index
        .incoming_matrix(&WorkerPool::from_config(config))
        .into_iter()
        .map(|(target, links)| MatrixRow {
            unit: target.name.clone(),
            sources: links.iter().map(BuffLink::summary).collect(),
        })
        .collect();
    info!(units = rows.len(), level, "computed incoming buff matrix");

    if as_table {
        let mut out = String::new();
        let _ = writeln!(out, "target\t{TABLE_HEADER}");
        for row in &rows {
            for summary in &row.sources {
                out.push_str(&row.unit);
                out.push('\t');
                table_line(&mut out, summary);
            }
        }
        print!("{out}");
        0
    } else {
        print_json(&rows)
    }
}

#[derive(Debug, Serialize)]
struct BuffValues<'a> {
    buff: &'a str,
    level: i64,
    affects: &'a AffectsPredicate,
    damage: Option<i64>,
    damage_bonus: Option<i64>,
}

fn handle_value(positional: &[&String], config: &SheetConfig) -> i32 {
    let (Some(unit_name), Some(buff_name)) = (positional.first(), positional.get(1)) else {
        eprintln!("usage: buffsheet value <unit> <buff> [level]");
        return 2;
    };
    let level = parse_level_arg(positional.get(2).copied(), config.level);

    let result: Result<i32> = load_roster(&config.roster_path).and_then(|roster| {
        let index = RosterBuffIndex::new(&roster, level);
        let unit = index.find_unit(unit_name)?;
        let values: Vec<BuffValues<'_>> = unit
            .buffs
            .iter()
            .filter(|buff| buff.name.eq_ignore_ascii_case(buff_name))
            .map(|buff| {
                let effect = buff.effect.as_ref();
                BuffValues {
                    buff: &buff.name,
                    level,
                    affects: &buff.affects,
                    damage: interpolate_buff_value(effect.and_then(|e| e.damage.as_ref()), level),
                    damage_bonus: interpolate_buff_value(
                        effect.and_then(|e| e.damage_bonus.as_ref()),
                        level,
                    ),
                }
            })
            .collect();
        if values.is_empty() {
            warn!(unit = %unit.name, buff = %buff_name, "unit has no buff with that name");
            return Ok(1);
        }
        Ok(print_json(&values))
    });

    match result {
        Ok(code) => code,
        Err(err) => {
            error!("value query failed: {err}");
            1
        }
    }
}

fn handle_validate(positional: &[&String], config: &SheetConfig) -> i32 {
    let path = positional
        .first()
        .map(|p| std::path::PathBuf::from(p.as_str()))
        .unwrap_or_else(|| config.roster_path.clone());

    match validate_roster_file(&path) {
        Ok(report) => {
            for diag in &report.diagnostics {
                eprintln!("- {diag}");
            }
            let errors = report.count(ValidationSeverity::Error);
            let warnings = report.count(ValidationSeverity::Warning);
            if report.has_errors() {
                eprintln!(
                    "validation failed: {} unit(s), {errors} error(s), {warnings} warning(s)",
                    report.unit_count
                );
                1
            } else {
                println!(
                    "validation passed: {} ({} unit(s), {warnings} warning(s))",
                    path.display(),
                    report.unit_count
                );
                0
            }
        }
        Err(err) => {
            error!("validation failed: {err}");
            1
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            error!("failed to serialize output: {err}");
            1
        }
    }
}

fn parse_level_arg(raw: Option<&String>, default: i64) -> i64 {
    raw.and_then(|value| value.parse::<i64>().ok())
        .unwrap_or_else(|| {
            if let Some(value) = raw {
                warn!("invalid level '{value}', defaulting to {default}");
            }
            default
        })
}
