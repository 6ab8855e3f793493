//! Sparse level -> value tables and the interpolation used to read them at an
//! arbitrary level.
//!
//! Data files store level maps as objects with string keys and (mostly) string
//! values, e.g. `{ "8": "10", "17": "22" }`. Anything that is not a mapping, or
//! a mapping with no usable entries, deserializes as an absent map.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::Bound::{Excluded, Unbounded};

use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Level-keyed value table, kept sorted by level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelMap {
    values: BTreeMap<i64, i64>,
    /// Levels stored as a numeric zero. Exact lookups skip them; `"0"` is not included.
    blank_levels: BTreeSet<i64>,
}

impl LevelMap {
    /// Build a map from `(level, value)` pairs. Returns `None` when no pairs are given,
    /// since an empty table is never a valid present map. Values are taken as numbers,
    /// so a zero here behaves like a numeric zero read from a file.
    pub fn from_pairs<I>(pairs: I) -> Option<Self>
    where
        I: IntoIterator<Item = (i64, i64)>,
    {
        Self::from_entries(pairs.into_iter().map(|(level, value)| (level, value, value == 0)))
    }

    fn from_entries<I>(entries: I) -> Option<Self>
    where
        I: IntoIterator<Item = (i64, i64, bool)>,
    {
        let mut map = Self::default();
        for (level, value, blank) in entries {
            map.values.insert(level, value);
            if blank {
                map.blank_levels.insert(level);
            } else {
                map.blank_levels.remove(&level);
            }
        }
        (!map.values.is_empty()).then_some(map)
    }

    pub fn get(&self, level: i64) -> Option<i64> {
        self.values.get(&level).copied()
    }

    /// Entries in ascending level order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.values.iter().map(|(level, value)| (*level, *value))
    }

    /// Value at `level`.
    ///
    /// An exact key is returned as-is unless it was stored as a numeric zero, which is
    /// treated like a missing key and falls through to the neighbour search. Below the
    /// lowest key the lowest value is used, above the highest key the highest value is
    /// used, and in between the two neighbours are linearly interpolated and rounded to
    /// the nearest integer (ties away from zero).
    pub fn value_at(&self, level: i64) -> Option<i64> {
        if !self.blank_levels.contains(&level) {
            if let Some(value) = self.get(level) {
                return Some(value);
            }
        }

        let lower = self.values.range(..level).next_back();
        let upper = self.values.range((Excluded(level), Unbounded)).next();

        match (lower, upper) {
            (None, Some((_, &upper_value))) => Some(upper_value),
            (Some((_, &lower_value)), None) => Some(lower_value),
            (Some((&lower_level, &lower_value)), Some((&upper_level, &upper_value))) => {
                let ratio = (level as f64 - lower_level as f64)
                    / (upper_level as f64 - lower_level as f64);
                let value = lower_value as f64 + (upper_value as f64 - lower_value as f64) * ratio;
                // `as` saturates at the i64 bounds.
                Some(value.round() as i64)
            }
            (None, None) => None,
        }
    }
}

/// Free-function form used by callers holding an optional map straight from a record.
pub fn interpolate_buff_value(map: Option<&LevelMap>, level: i64) -> Option<i64> {
    map?.value_at(level)
}

impl Serialize for LevelMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(untagged)]
        enum Stored {
            Number(i64),
            Text(String),
        }

        // A zero that was not stored as a number goes back out as text so it keeps
        // its exact-match behaviour when read again.
        serializer.collect_map(self.values.iter().map(|(level, value)| {
            let stored = if *value == 0 && !self.blank_levels.contains(level) {
                Stored::Text(value.to_string())
            } else {
                Stored::Number(*value)
            };
            (level.to_string(), stored)
        }))
    }
}

impl<'de> Deserialize<'de> for LevelMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let table = RawTable::deserialize(deserializer)?;
        Ok(table.into_level_map().unwrap_or_default())
    }
}

/// `deserialize_with` helper for optional level-map fields. Non-mapping and empty
/// inputs become `None` instead of failing the whole record.
pub(crate) fn deserialize_optional<'de, D>(deserializer: D) -> Result<Option<LevelMap>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MaybeTable {
        Table(RawTable),
        Other(IgnoredAny),
    }

    Ok(match Option::<MaybeTable>::deserialize(deserializer)? {
        Some(MaybeTable::Table(table)) => table.into_level_map(),
        Some(MaybeTable::Other(_)) | None => None,
    })
}

/// Scalar as it appears in roster files: a number, or a string holding one.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawNumber {
    Int(i64),
    Float(f64),
    Text(String),
    Other(IgnoredAny),
}

impl RawNumber {
    /// Integer reading that takes the leading integer of a string ("12abc" -> 12)
    /// and truncates floats.
    pub(crate) fn leading_int(&self) -> Option<i64> {
        match self {
            RawNumber::Int(value) => Some(*value),
            RawNumber::Float(value) if value.is_finite() => Some(value.trunc() as i64),
            RawNumber::Float(_) => None,
            RawNumber::Text(text) => parse_leading_int(text),
            RawNumber::Other(_) => None,
        }
    }

    /// Reading used for map keys: the whole string must be an integral number.
    /// Numeric zero, the only value an exact level lookup treats as missing.
    fn is_numeric_zero(&self) -> bool {
        match self {
            RawNumber::Int(value) => *value == 0,
            RawNumber::Float(value) => *value == 0.0,
            _ => false,
        }
    }

    fn as_level(&self) -> Option<i64> {
        match self {
            RawNumber::Int(value) => Some(*value),
            RawNumber::Float(value) if value.fract() == 0.0 && value.is_finite() => {
                Some(*value as i64)
            }
            RawNumber::Text(text) => {
                let text = text.trim();
                text.parse::<i64>().ok().or_else(|| {
                    text.parse::<f64>()
                        .ok()
                        .filter(|value| value.fract() == 0.0 && value.is_finite())
                        .map(|value| value as i64)
                })
            }
            _ => None,
        }
    }
}

fn parse_leading_int(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = digits
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(digits.len());
    let magnitude = digits[..end].parse::<i64>().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Raw mapping entries in file order; keys and values may be numbers or strings.
struct RawTable(Vec<(RawNumber, RawNumber)>);

impl RawTable {
    fn into_level_map(self) -> Option<LevelMap> {
        LevelMap::from_entries(self.0.into_iter().filter_map(|(key, value)| {
            Some((key.as_level()?, value.leading_int()?, value.is_numeric_zero()))
        }))
    }
}

impl<'de> Deserialize<'de> for RawTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = RawTable;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping from level to value")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<RawTable, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry::<RawNumber, RawNumber>()? {
                    entries.push(entry);
                }
                Ok(RawTable(entries))
            }
        }

        deserializer.deserialize_map(TableVisitor)
    }
}
