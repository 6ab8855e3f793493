//! Targeting predicates: which units a buff can reach and how narrowly it targets them.

use serde::{Deserialize, Serialize};

use crate::buffs::unit::{string_list, CombatUnit};

/// Matches every unit when listed under `grand_alliance` or `faction`.
pub const WILDCARD: &str = "*";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffectsPredicate {
    #[serde(default, deserialize_with = "string_list")]
    pub grand_alliance: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub faction: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub traits: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub damage_types: Vec<String>,
}

/// The rule that made a predicate match, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    Universal,
    Faction,
    GrandAlliance,
    Trait,
    DamageType,
}

impl MatchRule {
    /// Narrowness rank. Only compared between same-named buff variants.
    pub const fn specificity(self) -> u8 {
        match self {
            MatchRule::Universal => 0,
            MatchRule::Faction => 3,
            MatchRule::GrandAlliance => 2,
            MatchRule::Trait | MatchRule::DamageType => 1,
        }
    }

    pub const fn is_universal(self) -> bool {
        matches!(self, MatchRule::Universal)
    }
}

/// Flat view of a match result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AffectsMatch {
    pub matches: bool,
    pub specificity: u8,
    pub is_universal: bool,
}

impl From<Option<MatchRule>> for AffectsMatch {
    fn from(rule: Option<MatchRule>) -> Self {
        match rule {
            Some(rule) => AffectsMatch {
                matches: true,
                specificity: rule.specificity(),
                is_universal: rule.is_universal(),
            },
            None => AffectsMatch::default(),
        }
    }
}

impl AffectsPredicate {
    /// First rule that matches `target`, or `None`. Rules never stack.
    pub fn evaluate(&self, target: &CombatUnit) -> Option<MatchRule> {
        if contains(&self.grand_alliance, WILDCARD) || contains(&self.faction, WILDCARD) {
            return Some(MatchRule::Universal);
        }
        if contains(&self.faction, &target.faction) {
            return Some(MatchRule::Faction);
        }
        if let Some(alliance) = target.grand_alliance.as_deref() {
            if contains(&self.grand_alliance, alliance) {
                return Some(MatchRule::GrandAlliance);
            }
        }
        if self.traits.iter().any(|t| target.traits.contains(t)) {
            return Some(MatchRule::Trait);
        }
        if self.damage_types.iter().any(|d| target.damage_types.contains(d)) {
            return Some(MatchRule::DamageType);
        }
        None
    }

    pub fn match_target(&self, target: &CombatUnit) -> AffectsMatch {
        self.evaluate(target).into()
    }

    /// True when no list names anything, so the predicate can never match.
    pub fn is_empty(&self) -> bool {
        self.grand_alliance.is_empty()
            && self.faction.is_empty()
            && self.traits.is_empty()
            && self.damage_types.is_empty()
    }
}

fn contains(list: &[String], value: &str) -> bool {
    list.iter().any(|entry| entry == value)
}
