//! Buff engine: targeting, same-name resolution, level interpolation and damage
//! aggregation over a roster of units.

pub mod affects;
pub mod damage;
pub mod level_map;
pub mod resolver;
pub mod roster_index;
pub mod unit;

pub use affects::{AffectsMatch, AffectsPredicate, MatchRule, WILDCARD};
pub use damage::{
    compute_buff_damage, BuffDamage, BuffDamageRow, BuffDamageTotals, EffectChannel,
};
pub use level_map::{interpolate_buff_value, LevelMap};
pub use resolver::{resolve_buffs, ResolvedBuff};
pub use roster_index::{
    incoming_buffs, outgoing_buffs, BuffLink, BuffLinkSummary, RosterBuffIndex,
};
pub use unit::{
    AttackKind, BuffDefinition, BuffEffect, CombatUnit, OmitMode, Restriction, UnitStats,
};
