//! Per-target aggregation of resolved buffs into melee/ranged damage contributions.

use serde::Serialize;

use crate::buffs::level_map::LevelMap;
use crate::buffs::resolver::ResolvedBuff;
use crate::buffs::unit::{AttackKind, BuffEffect, CombatUnit};

/// Effect channel of a buff. Each channel is processed independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectChannel {
    /// `effect.damage`
    Damage,
    /// `effect.damage_bonus`
    Bonus,
}

impl EffectChannel {
    pub const ALL: [EffectChannel; 2] = [EffectChannel::Damage, EffectChannel::Bonus];

    pub fn level_map(self, effect: &BuffEffect) -> Option<&LevelMap> {
        match self {
            EffectChannel::Damage => effect.damage.as_ref(),
            EffectChannel::Bonus => effect.damage_bonus.as_ref(),
        }
    }

    pub fn is_bonus(self) -> bool {
        self == EffectChannel::Bonus
    }

    /// Row label: bonus rows carry a trailing `+`.
    pub fn row_name(self, buff_name: &str) -> String {
        match self {
            EffectChannel::Damage => buff_name.to_string(),
            EffectChannel::Bonus => format!("{buff_name}+"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuffDamageRow {
    pub name: String,
    /// Interpolated per-hit value.
    pub value: i64,
    pub buffed_melee: i64,
    pub buffed_range: i64,
    pub is_bonus: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuffDamageTotals {
    /// Sum of flat damage values, not multiplied by hits.
    pub damage: i64,
    /// Sum of flat bonus values, not multiplied by hits.
    pub bonus: i64,
    pub buffed_melee: i64,
    pub buffed_range: i64,
    pub buffed_bonus_melee: i64,
    pub buffed_bonus_range: i64,
}

/// Sums saturate at the i64 bounds.
impl BuffDamageTotals {
    pub fn apply(&mut self, channel: EffectChannel, value: i64, melee: i64, range: i64) {
        let (flat, buffed_melee, buffed_range) = match channel {
            EffectChannel::Damage => (
                &mut self.damage,
                &mut self.buffed_melee,
                &mut self.buffed_range,
            ),
            EffectChannel::Bonus => (
                &mut self.bonus,
                &mut self.buffed_bonus_melee,
                &mut self.buffed_bonus_range,
            ),
        };
        *flat = flat.saturating_add(value);
        *buffed_melee = buffed_melee.saturating_add(melee);
        *buffed_range = buffed_range.saturating_add(range);
    }

    /// Ranking key: every buffed total, both attack kinds and both channels.
    pub fn combined(&self) -> i64 {
        [
            self.buffed_melee,
            self.buffed_bonus_melee,
            self.buffed_range,
            self.buffed_bonus_range,
        ]
        .into_iter()
        .fold(0, i64::saturating_add)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuffDamage {
    pub has_melee: bool,
    pub has_range: bool,
    pub melee_hits: Option<u32>,
    pub range_hits: Option<u32>,
    pub buff_rows: Vec<BuffDamageRow>,
    pub totals: BuffDamageTotals,
}

impl BuffDamage {
    fn empty(target: &CombatUnit) -> Self {
        Self {
            has_melee: target.has_melee(),
            has_range: target.has_range(),
            melee_hits: target.stats.melee,
            range_hits: target.stats.range,
            buff_rows: Vec::new(),
            totals: BuffDamageTotals::default(),
        }
    }

    fn contribution(&self, effect: &BuffEffect, attack: AttackKind, value: i64) -> i64 {
        let hits = match attack {
            AttackKind::Melee => self.melee_hits,
            AttackKind::Range => self.range_hits,
        };
        match hits {
            Some(hits) if effect.allows(attack) => {
                if effect.single_hit {
                    value
                } else {
                    i64::from(hits).saturating_mul(value)
                }
            }
            _ => 0,
        }
    }

    fn add_channel(
        &mut self,
        buff: &ResolvedBuff,
        effect: &BuffEffect,
        channel: EffectChannel,
        level: i64,
    ) {
        let Some(value) = channel.level_map(effect).and_then(|map| map.value_at(level)) else {
            return;
        };

        let buffed_melee = self.contribution(effect, AttackKind::Melee, value);
        let buffed_range = self.contribution(effect, AttackKind::Range, value);

        // A channel that buffs neither attack leaves no trace, flat value included.
        if buffed_melee <= 0 && buffed_range <= 0 {
            return;
        }

        self.totals.apply(channel, value, buffed_melee, buffed_range);
        self.buff_rows.push(BuffDamageRow {
            name: channel.row_name(&buff.buff_name),
            value,
            buffed_melee,
            buffed_range,
            is_bonus: channel.is_bonus(),
        });
    }
}

/// Damage contributions of `buffs` on `target`, with every level map read at `level`.
///
/// Buffs without an effect and channels without a value are skipped. Restricted buffs
/// only reach their attack kind; single-hit buffs add their value once instead of per hit.
pub fn compute_buff_damage(
    target: &CombatUnit,
    buffs: &[ResolvedBuff],
    level: i64,
) -> BuffDamage {
    let mut result = BuffDamage::empty(target);

    for buff in buffs {
        let Some(effect) = buff.effect.as_ref() else {
            continue;
        };
        for channel in EffectChannel::ALL {
            result.add_channel(buff, effect, channel, level);
        }
    }

    result
}
