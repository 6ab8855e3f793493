//! Pairwise buff listings across a roster: who can buff a unit, and whom a unit can buff.

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::buffs::damage::{compute_buff_damage, BuffDamage, BuffDamageTotals};
use crate::buffs::resolver::{resolve_buffs, ResolvedBuff};
use crate::buffs::unit::CombatUnit;
use crate::data::roster::find_unit;
use crate::error::{BuffSheetError, Result};
use crate::parallel::WorkerPool;

/// One entry of a listing: the other unit of the pair, the buffs that flow between
/// them, and their damage on the receiving unit.
#[derive(Debug, Clone, Serialize)]
pub struct BuffLink<'a> {
    pub unit: &'a CombatUnit,
    pub buffs: Vec<ResolvedBuff>,
    pub damage: BuffDamage,
}

impl BuffLink<'_> {
    pub fn combined_total(&self) -> i64 {
        self.damage.totals.combined()
    }

    pub fn summary(&self) -> BuffLinkSummary {
        BuffLinkSummary {
            unit: self.unit.name.clone(),
            buffs: self.buffs.iter().map(|b| b.buff_name.clone()).collect(),
            total: self.combined_total(),
            totals: self.damage.totals,
        }
    }
}

/// Owned, compact form of a [BuffLink] for output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuffLinkSummary {
    pub unit: String,
    pub buffs: Vec<String>,
    pub total: i64,
    pub totals: BuffDamageTotals,
}

/// Stable sort, highest combined buffed total first.
fn rank_links(mut links: Vec<BuffLink<'_>>) -> Vec<BuffLink<'_>> {
    links.sort_by(|left, right| right.combined_total().cmp(&left.combined_total()));
    links
}

/// Every other roster unit that grants `target` at least one buff, ranked.
pub fn incoming_buffs<'a>(
    target: &CombatUnit,
    roster: &'a [CombatUnit],
    level: i64,
) -> Vec<BuffLink<'a>> {
    let links: Vec<BuffLink<'a>> = roster
        .iter()
        .filter(|source| !source.is_same_unit(target))
        .filter_map(|source| {
            let buffs = resolve_buffs(source, target);
            if buffs.is_empty() {
                return None;
            }
            let damage = compute_buff_damage(target, &buffs, level);
            Some(BuffLink {
                unit: source,
                buffs,
                damage,
            })
        })
        .collect();
    debug!(unit = %target.name, sources = links.len(), level, "resolved incoming buffs");
    rank_links(links)
}

/// Every other roster unit that receives at least one buff from `source`, ranked.
pub fn outgoing_buffs<'a>(
    source: &CombatUnit,
    roster: &'a [CombatUnit],
    level: i64,
) -> Vec<BuffLink<'a>> {
    let links: Vec<BuffLink<'a>> = roster
        .iter()
        .filter(|target| !target.is_same_unit(source))
        .filter_map(|target| {
            let buffs = resolve_buffs(source, target);
            if buffs.is_empty() {
                return None;
            }
            let damage = compute_buff_damage(target, &buffs, level);
            Some(BuffLink {
                unit: target,
                buffs,
                damage,
            })
        })
        .collect();
    debug!(unit = %source.name, targets = links.len(), level, "resolved outgoing buffs");
    rank_links(links)
}

/// Read-only view over a roster at a fixed reference level.
#[derive(Debug, Clone, Copy)]
pub struct RosterBuffIndex<'a> {
    roster: &'a [CombatUnit],
    level: i64,
}

impl<'a> RosterBuffIndex<'a> {
    pub fn new(roster: &'a [CombatUnit], level: i64) -> Self {
        Self { roster, level }
    }

    pub fn level(&self) -> i64 {
        self.level
    }

    pub fn find_unit(&self, name: &str) -> Result<&'a CombatUnit> {
        find_unit(self.roster, name).ok_or_else(|| BuffSheetError::UnitNotFound(name.to_string()))
    }

    pub fn incoming(&self, name: &str) -> Result<Vec<BuffLink<'a>>> {
        let target = self.find_unit(name)?;
        Ok(incoming_buffs(target, self.roster, self.level))
    }

    pub fn outgoing(&self, name: &str) -> Result<Vec<BuffLink<'a>>> {
        let source = self.find_unit(name)?;
        Ok(outgoing_buffs(source, self.roster, self.level))
    }

    /// Incoming listing for every unit, computed in parallel, in roster order.
    pub fn incoming_matrix(&self, pool: &WorkerPool) -> Vec<(&'a CombatUnit, Vec<BuffLink<'a>>)> {
        let roster = self.roster;
        let level = self.level;
        pool.install(|| {
            roster
                .par_iter()
                .map(|target| (target, incoming_buffs(target, roster, level)))
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffs::affects::AffectsPredicate;
    use crate::buffs::level_map::LevelMap;
    use crate::buffs::unit::{BuffDefinition, BuffEffect, UnitStats};

    fn unit(name: &str, faction: &str, melee: u32, buffs: Vec<BuffDefinition>) -> CombatUnit {
        CombatUnit {
            name: name.to_string(),
            faction: faction.to_string(),
            stats: UnitStats {
                melee: Some(melee),
                range: None,
            },
            buffs,
            ..CombatUnit::default()
        }
    }

    fn faction_buff(name: &str, faction: &str, value: i64) -> BuffDefinition {
        BuffDefinition {
            name: name.to_string(),
            effect: Some(BuffEffect {
                damage: LevelMap::from_pairs([(1, value)]),
                ..BuffEffect::default()
            }),
            affects: AffectsPredicate {
                faction: vec![faction.to_string()],
                ..AffectsPredicate::default()
            },
            omit: None,
        }
    }

    fn roster() -> Vec<CombatUnit> {
        vec![
            unit("Captain", "Guard", 2, vec![faction_buff("Orders", "Guard", 5)]),
            unit("Sergeant", "Guard", 3, vec![faction_buff("Drill", "Guard", 5)]),
            unit("Trooper", "Guard", 3, Vec::new()),
            unit("Veteran", "Guard", 2, vec![faction_buff("Drill", "Guard", 5)]),
        ]
    }

    #[test]
    fn incoming_excludes_self_and_ranks_with_stable_ties() {
        let roster = roster();
        let index = RosterBuffIndex::new(&roster, 10);

        let names: Vec<String> = index
            .incoming("Trooper")
            .unwrap()
            .iter()
            .map(|link| link.unit.name.clone())
            .collect();
        assert_eq!(names, vec!["Captain", "Sergeant", "Veteran"]);

        let incoming = index.incoming("Captain").unwrap();
        assert!(incoming.iter().all(|link| link.unit.name != "Captain"));
        assert_eq!(incoming.len(), 2);
    }

    #[test]
    fn outgoing_ranks_by_combined_total() {
        let roster = roster();
        let index = RosterBuffIndex::new(&roster, 10);
        let outgoing = index.outgoing("captain").unwrap();
        let summary: Vec<(String, i64)> = outgoing
            .iter()
            .map(|link| (link.unit.name.clone(), link.combined_total()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Sergeant".to_string(), 15),
                ("Trooper".to_string(), 15),
                ("Veteran".to_string(), 10),
            ]
        );
    }

    #[test]
    fn unknown_unit_is_an_error() {
        let roster = roster();
        let index = RosterBuffIndex::new(&roster, 10);
        assert!(matches!(
            index.incoming("Commissar"),
            Err(BuffSheetError::UnitNotFound(name)) if name == "Commissar"
        ));
    }

    #[test]
    fn matrix_matches_single_queries() {
        let roster = roster();
        let index = RosterBuffIndex::new(&roster, 10);
        let matrix = index.incoming_matrix(&WorkerPool::with_workers(2));
        assert_eq!(matrix.len(), roster.len());
        for (target, links) in matrix {
            let single = index.incoming(&target.name).unwrap();
            let expected: Vec<_> = single.iter().map(BuffLink::summary).collect();
            let actual: Vec<_> = links.iter().map(BuffLink::summary).collect();
            assert_eq!(actual, expected);
        }
    }
}
