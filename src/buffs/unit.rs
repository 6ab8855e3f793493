//! Roster records: units, the buffs they grant, and the effect payload of a buff.

use std::collections::BTreeSet;

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use crate::buffs::affects::AffectsPredicate;
use crate::buffs::level_map::{self, LevelMap, RawNumber};

/// A single roster entry. Can grant buffs (through `buffs`) and receive them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombatUnit {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub faction: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grand_alliance: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub traits: BTreeSet<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub damage_types: BTreeSet<String>,
    #[serde(default, deserialize_with = "lenient_stats")]
    pub stats: UnitStats,
    #[serde(default, deserialize_with = "null_as_default")]
    pub buffs: Vec<BuffDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portrait_url: Option<String>,
}

impl CombatUnit {
    /// Identity check used to keep a unit from buffing itself. Names are unique
    /// within a roster.
    pub fn is_same_unit(&self, other: &CombatUnit) -> bool {
        std::ptr::eq(self, other) || self.name == other.name
    }

    pub fn has_melee(&self) -> bool {
        self.stats.melee.is_some()
    }

    pub fn has_range(&self) -> bool {
        self.stats.range.is_some()
    }
}

/// Hit counts per attack. A present key means the unit has that attack even when the
/// count is zero; unreadable counts are kept as present with zero hits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStats {
    #[serde(default, deserialize_with = "present_hits", skip_serializing_if = "Option::is_none")]
    pub melee: Option<u32>,
    #[serde(default, deserialize_with = "present_hits", skip_serializing_if = "Option::is_none")]
    pub range: Option<u32>,
}

/// A buff owned by one unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuffDefinition {
    pub name: String,
    #[serde(
        default,
        deserialize_with = "known_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub effect: Option<BuffEffect>,
    #[serde(default, deserialize_with = "known_or_default")]
    pub affects: AffectsPredicate,
    #[serde(default, deserialize_with = "lenient_omit", skip_serializing_if = "Option::is_none")]
    pub omit: Option<OmitMode>,
}

/// Effect payload of a buff. `damage` and `damage_bonus` are independent channels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuffEffect {
    #[serde(
        default,
        deserialize_with = "level_map::deserialize_optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub damage: Option<LevelMap>,
    #[serde(
        default,
        deserialize_with = "level_map::deserialize_optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub damage_bonus: Option<LevelMap>,
    #[serde(
        default,
        deserialize_with = "lenient_restriction",
        skip_serializing_if = "Option::is_none"
    )]
    pub restriction: Option<Restriction>,
    #[serde(default, deserialize_with = "strict_true")]
    pub single_hit: bool,
}

impl BuffEffect {
    /// Whether this effect may apply to the given attack kind.
    pub fn allows(&self, attack: AttackKind) -> bool {
        match (self.restriction, attack) {
            (Some(Restriction::Ranged), AttackKind::Melee) => false,
            (Some(Restriction::Melee), AttackKind::Range) => false,
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackKind {
    Melee,
    Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Restriction {
    Melee,
    Ranged,
    /// Any other value; the buff is not restricted.
    #[serde(other)]
    Unrestricted,
}

/// Display annotation carried through to resolved buffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OmitMode {
    #[serde(rename = "normal")]
    Normal,
    #[serde(rename = "non-normal")]
    NonNormal,
    #[serde(other)]
    Unknown,
}

/// A value of the expected shape, or anything else.
#[derive(Deserialize)]
#[serde(untagged)]
enum MaybeKnown<T> {
    Known(T),
    Other(IgnoredAny),
}

impl<T> MaybeKnown<T> {
    fn known(self) -> Option<T> {
        match self {
            MaybeKnown::Known(value) => Some(value),
            MaybeKnown::Other(_) => None,
        }
    }
}

/// Present but unreadable values become `fallback`; absent and null stay `None`.
fn known_or<'de, D, T>(deserializer: D, fallback: T) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<MaybeKnown<T>>::deserialize(deserializer)?
        .map(|value| value.known().unwrap_or(fallback)))
}

fn lenient_restriction<'de, D>(deserializer: D) -> Result<Option<Restriction>, D::Error>
where
    D: Deserializer<'de>,
{
    known_or(deserializer, Restriction::Unrestricted)
}

fn lenient_omit<'de, D>(deserializer: D) -> Result<Option<OmitMode>, D::Error>
where
    D: Deserializer<'de>,
{
    known_or(deserializer, OmitMode::Unknown)
}

fn known_or_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<MaybeKnown<T>>::deserialize(deserializer)?.and_then(MaybeKnown::known))
}

fn known_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(known_or_none(deserializer)?.unwrap_or_default())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts a list of strings, a single string, or null.
pub(crate) fn string_list<'de, D, C>(deserializer: D) -> Result<C, D::Error>
where
    D: Deserializer<'de>,
    C: FromIterator<String>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(value)) => std::iter::once(value).collect(),
        Some(OneOrMany::Many(values)) => values.into_iter().collect(),
        None => std::iter::empty().collect(),
    })
}

fn lenient_stats<'de, D>(deserializer: D) -> Result<UnitStats, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MaybeStats {
        Table(UnitStats),
        Other(IgnoredAny),
    }

    Ok(match Option::<MaybeStats>::deserialize(deserializer)? {
        Some(MaybeStats::Table(stats)) => stats,
        Some(MaybeStats::Other(_)) | None => UnitStats::default(),
    })
}

/// Only called when the key exists, so the result is always `Some`.
fn present_hits<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let hits = Option::<RawNumber>::deserialize(deserializer)?
        .and_then(|raw| raw.leading_int())
        .map(|value| value.clamp(0, i64::from(u32::MAX)) as u32)
        .unwrap_or(0);
    Ok(Some(hits))
}

/// Only a literal boolean `true` enables the flag.
fn strict_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MaybeBool {
        Flag(bool),
        Other(IgnoredAny),
    }

    Ok(matches!(
        Option::<MaybeBool>::deserialize(deserializer)?,
        Some(MaybeBool::Flag(true))
    ))
}
