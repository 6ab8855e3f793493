//! Roster loading from JSON or YAML files, and name lookup.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::buffs::CombatUnit;
use crate::error::{BuffSheetError, Result};

pub const DEFAULT_ROSTER_PATH: &str = "data/units.json";

/// Roster files are either a bare array of units or `{ "units": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RosterFile {
    List(Vec<CombatUnit>),
    Wrapped { units: Vec<CombatUnit> },
}

impl RosterFile {
    fn into_units(self) -> Vec<CombatUnit> {
        match self {
            RosterFile::List(units) | RosterFile::Wrapped { units } => units,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterFormat {
    Json,
    Yaml,
}

impl RosterFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(RosterFormat::Json),
            Some("yaml") | Some("yml") => Ok(RosterFormat::Yaml),
            other => Err(BuffSheetError::UnsupportedFormat(
                other.unwrap_or("").to_string(),
            )),
        }
    }
}

pub fn parse_roster(raw: &str, format: RosterFormat) -> Result<Vec<CombatUnit>> {
    let parsed: RosterFile = match format {
        RosterFormat::Json => serde_json::from_str(raw)?,
        RosterFormat::Yaml => serde_yaml::from_str(raw)?,
    };
    Ok(parsed.into_units())
}

/// Load a roster file. Duplicate names are kept but reported, since lookups and
/// self-exclusion both go by name.
pub fn load_roster(path: impl AsRef<Path>) -> Result<Vec<CombatUnit>> {
    let path = path.as_ref();
    let format = RosterFormat::from_path(path)?;
    let raw = fs::read_to_string(path).map_err(|source| BuffSheetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let units = parse_roster(&raw, format)?;

    let mut seen = std::collections::HashSet::new();
    for unit in &units {
        if !seen.insert(unit.name.as_str()) {
            warn!(unit = %unit.name, path = %path.display(), "duplicate unit name in roster");
        }
    }
    debug!(path = %path.display(), units = units.len(), "loaded roster");
    Ok(units)
}

/// Normalize a name for lookup: lowercase, spaces/underscores collapsed.
pub fn normalize_lookup(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() || c == '_' { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Find a unit by exact name, falling back to a normalized comparison.
pub fn find_unit<'a>(roster: &'a [CombatUnit], name: &str) -> Option<&'a CombatUnit> {
    if let Some(unit) = roster.iter().find(|unit| unit.name == name) {
        return Some(unit);
    }
    let normalized = normalize_lookup(name);
    roster
        .iter()
        .find(|unit| normalize_lookup(&unit.name) == normalized)
}
