//! Resolves the buffs a source unit grants to one target.

use std::collections::HashMap;

use serde::Serialize;

use crate::buffs::affects::MatchRule;
use crate::buffs::unit::{BuffDefinition, BuffEffect, CombatUnit, OmitMode};

/// A buff known to apply to a specific target, detached from its targeting predicate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedBuff {
    pub buff_name: String,
    pub source_name: String,
    pub effect: Option<BuffEffect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub omit: Option<OmitMode>,
}

impl ResolvedBuff {
    pub fn from_definition(source: &CombatUnit, definition: &BuffDefinition) -> Self {
        Self {
            buff_name: definition.name.clone(),
            source_name: source.name.clone(),
            effect: definition.effect.clone(),
            omit: definition.omit,
        }
    }
}

/// One resolved buff per buff name that `source` grants to `target`.
///
/// When several same-named definitions match, the one with the highest specificity
/// wins; on a tie the earliest-declared definition is kept. Output follows the order
/// in which each name first matched. A unit never buffs itself.
pub fn resolve_buffs(source: &CombatUnit, target: &CombatUnit) -> Vec<ResolvedBuff> {
    if source.is_same_unit(target) {
        return Vec::new();
    }

    let mut winners: Vec<(&BuffDefinition, MatchRule)> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();

    for definition in &source.buffs {
        let Some(rule) = definition.affects.evaluate(target) else {
            continue;
        };
        match slots.get(definition.name.as_str()) {
            Some(&slot) => {
                if rule.specificity() > winners[slot].1.specificity() {
                    winners[slot] = (definition, rule);
                }
            }
            None => {
                slots.insert(definition.name.as_str(), winners.len());
                winners.push((definition, rule));
            }
        }
    }

    winners
        .into_iter()
        .map(|(definition, _)| ResolvedBuff::from_definition(source, definition))
        .collect()
}
