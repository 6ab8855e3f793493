//! Roster linting. The engine tolerates partial data, so this is where malformed
//! records get reported instead.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::buffs::{AffectsPredicate, WILDCARD};
use crate::data::roster::RosterFormat;
use crate::error::{BuffSheetError, Result};

/// How much a finding matters to the engine. Errors mean data the loader drops or
/// rejects; warnings mean data that loads but cannot do what it appears to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValidationSeverity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        })
    }
}

/// One finding, located by a path such as `units[2] name='Bellator'.buffs[0].effect`.
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
    /// Entries in the roster, readable or not.
    pub unit_count: usize,
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

    pub fn count(&self, severity: ValidationSeverity) -> usize {
        self.diagnostics
            .iter()
            .filter(|diag| diag.severity == severity)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity == ValidationSeverity::Error)
    }
}

const RESTRICTION_ENUM: &[&str] = &["melee", "ranged"];
const OMIT_ENUM: &[&str] = &["normal", "non-normal"];
const PREDICATE_LISTS: &[&str] = &["grand_alliance", "faction", "traits", "damage_types"];

/// Validate a roster file (`.json`, `.yaml` or `.yml`).
pub fn validate_roster_file(path: impl AsRef<Path>) -> Result<ValidationReport> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| BuffSheetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let payload = match RosterFormat::from_path(path)? {
        RosterFormat::Json => serde_json::from_str::<Value>(&raw)?,
        RosterFormat::Yaml => {
            serde_json::to_value(serde_yaml::from_str::<serde_yaml::Value>(&raw)?)?
        }
    };
    Ok(validate_roster_value(&payload))
}

pub fn validate_roster_value(payload: &Value) -> ValidationReport {
    let mut report = ValidationReport::default();

    let Some(entries) = payload
        .get("units")
        .and_then(Value::as_array)
        .or_else(|| payload.as_array())
    else {
        report.push(
            ValidationSeverity::Error,
            "roster",
            "expected top-level JSON array or { units: [...] }",
        );
        return report;
    };

    report.unit_count = entries.len();
    let mut seen_names = HashSet::new();

    for (index, entry) in entries.iter().enumerate() {
        let base_context = format!("units[{index}]");
        let Some(object) = entry.as_object() else {
            report.push(ValidationSeverity::Error, base_context, "entry is not an object");
            continue;
        };

        let unit_name = match object.get("name").and_then(Value::as_str) {
            Some(name) if !name.trim().is_empty() => {
                if !seen_names.insert(name.to_string()) {
                    report.push(
                        ValidationSeverity::Error,
                        format!("{base_context}.name"),
                        format!("duplicate name '{name}'"),
                    );
                }
                name.to_string()
            }
            _ => {
                report.push(
                    ValidationSeverity::Error,
                    format!("{base_context}.name"),
                    "missing non-empty 'name'",
                );
                "<missing-name>".to_string()
            }
        };
        let context = format!("{base_context} name='{unit_name}'");

        if !object.get("faction").is_some_and(Value::is_string) {
            report.push(
                ValidationSeverity::Warning,
                format!("{context}.faction"),
                "missing 'faction'; faction-targeted buffs cannot match",
            );
        }

        validate_stats(&mut report, object, &context);
        validate_buffs(&mut report, object, &context);
    }

    report
}

fn validate_stats(report: &mut ValidationReport, object: &Map<String, Value>, context: &str) {
    let Some(stats) = object.get("stats") else {
        report.push(
            ValidationSeverity::Info,
            format!("{context}.stats"),
            "no stats; buffs on this unit compute to zero",
        );
        return;
    };
    let Some(stats) = stats.as_object() else {
        report.push(
            ValidationSeverity::Warning,
            format!("{context}.stats"),
            "expected object; treated as no melee and no range",
        );
        return;
    };

    for key in ["melee", "range"] {
        let Some(value) = stats.get(key) else {
            continue;
        };
        match numeric(value) {
            Some(hits) if hits < 0 => report.push(
                ValidationSeverity::Error,
                format!("{context}.stats.{key}"),
                format!("negative hit count {hits}"),
            ),
            Some(_) => {}
            None => report.push(
                ValidationSeverity::Warning,
                format!("{context}.stats.{key}"),
                "hit count is not a number; treated as zero hits",
            ),
        }
    }
}

fn validate_buffs(report: &mut ValidationReport, object: &Map<String, Value>, context: &str) {
    let Some(buffs) = object.get("buffs") else {
        return;
    };
    let Some(buffs) = buffs.as_array() else {
        report.push(ValidationSeverity::Error, format!("{context}.buffs"), "expected array");
        return;
    };

    let mut predicates_by_name: HashMap<&str, Vec<&Value>> = HashMap::new();

    for (buff_index, buff) in buffs.iter().enumerate() {
        let buff_context = format!("{context}.buffs[{buff_index}]");
        let Some(buff) = buff.as_object() else {
            report.push(ValidationSeverity::Error, buff_context, "buff is not an object");
            continue;
        };

        let name = match buff.get("name").and_then(Value::as_str) {
            Some(name) if !name.trim().is_empty() => Some(name),
            _ => {
                report.push(
                    ValidationSeverity::Error,
                    format!("{buff_context}.name"),
                    "missing non-empty 'name'",
                );
                None
            }
        };

        validate_effect(report, buff.get("effect"), &buff_context);
        validate_affects(report, buff.get("affects"), &buff_context);

        if let Some(omit) = buff.get("omit") {
            if !omit.as_str().is_some_and(|value| OMIT_ENUM.contains(&value)) {
                report.push(
                    ValidationSeverity::Warning,
                    format!("{buff_context}.omit"),
                    format!("unknown omit value {omit}"),
                );
            }
        }

        if let Some(name) = name {
            let affects = buff.get("affects").unwrap_or(&Value::Null);
            let earlier = predicates_by_name.entry(name).or_default();
            if earlier.contains(&affects) {
                report.push(
                    ValidationSeverity::Warning,
                    buff_context,
                    format!(
                        "'{name}' repeats the targeting of an earlier definition \
                         and is never selected"
                    ),
                );
            }
            earlier.push(affects);
        }
    }
}

fn validate_effect(report: &mut ValidationReport, effect: Option<&Value>, context: &str) {
    let context = format!("{context}.effect");
    let Some(effect) = effect.and_then(Value::as_object) else {
        report.push(
            ValidationSeverity::Warning,
            context,
            "missing effect object; buff never contributes",
        );
        return;
    };

    let mut has_channel = false;
    for key in ["damage", "damage_bonus"] {
        if let Some(map) = effect.get(key) {
            has_channel |= validate_level_map(report, map, &format!("{context}.{key}"));
        }
    }
    if !has_channel {
        report.push(
            ValidationSeverity::Warning,
            context.clone(),
            "neither 'damage' nor 'damage_bonus' is usable",
        );
    }

    if let Some(restriction) = effect.get("restriction") {
        if !restriction
            .as_str()
            .is_some_and(|value| RESTRICTION_ENUM.contains(&value))
        {
            report.push(
                ValidationSeverity::Warning,
                format!("{context}.restriction"),
                format!("unknown restriction {restriction}; buff is unrestricted"),
            );
        }
    }

    if let Some(single_hit) = effect.get("single_hit") {
        if !single_hit.is_boolean() {
            report.push(
                ValidationSeverity::Warning,
                format!("{context}.single_hit"),
                "expected boolean; only literal true enables single-hit",
            );
        }
    }
}

/// Returns true when the map yields at least one usable entry.
fn validate_level_map(report: &mut ValidationReport, map: &Value, context: &str) -> bool {
    let Some(map) = map.as_object() else {
        report.push(
            ValidationSeverity::Error,
            context,
            "expected mapping from level to value",
        );
        return false;
    };
    if map.is_empty() {
        report.push(ValidationSeverity::Warning, context, "empty level map");
        return false;
    }

    let mut usable = 0;
    for (level, value) in map {
        if level.trim().parse::<i64>().is_err() {
            report.push(
                ValidationSeverity::Error,
                format!("{context}[{level}]"),
                "level key is not an integer",
            );
            continue;
        }
        match numeric(value) {
            Some(0) if value.is_number() => report.push(
                ValidationSeverity::Info,
                format!("{context}[{level}]"),
                "numeric zero is interpolated from neighbouring levels; \
                 store \"0\" for an exact zero",
            ),
            Some(_) => usable += 1,
            None => report.push(
                ValidationSeverity::Error,
                format!("{context}[{level}]"),
                format!("value {value} is not numeric"),
            ),
        }
    }
    usable > 0
}

fn validate_affects(report: &mut ValidationReport, affects: Option<&Value>, context: &str) {
    let context = format!("{context}.affects");
    let Some(fields) = affects.and_then(Value::as_object) else {
        report.push(
            ValidationSeverity::Warning,
            context,
            "missing affects; buff never matches",
        );
        return;
    };

    for key in PREDICATE_LISTS {
        match fields.get(*key) {
            None | Some(Value::Null) | Some(Value::String(_)) => {}
            Some(Value::Array(items)) => {
                if items.iter().any(|item| !item.is_string()) {
                    report.push(
                        ValidationSeverity::Error,
                        format!("{context}.{key}"),
                        "list entries must be strings",
                    );
                }
                let is_wildcard_list = matches!(*key, "grand_alliance" | "faction");
                if !is_wildcard_list && items.iter().any(|item| item.as_str() == Some(WILDCARD)) {
                    report.push(
                        ValidationSeverity::Warning,
                        format!("{context}.{key}"),
                        "'*' is only a wildcard under grand_alliance or faction",
                    );
                }
            }
            Some(_) => report.push(
                ValidationSeverity::Error,
                format!("{context}.{key}"),
                "expected list of strings",
            ),
        }
    }
    // Same reading as the loader: an unreadable predicate targets nothing.
    let predicate = affects
        .and_then(|value| AffectsPredicate::deserialize(value).ok())
        .unwrap_or_default();
    if predicate.is_empty() {
        report.push(
            ValidationSeverity::Warning,
            context,
            "no targeting lists; buff never matches",
        );
    }
}

fn numeric(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|v| v.trunc() as i64)),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
}
