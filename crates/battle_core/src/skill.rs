//! Battle skills, damage/healing formulas, and skill progression.
//!
//! Skill effects are a tagged variant so each category carries only the
//! fields it needs - a damage spec, a healing amount, or nothing (pure
//! status application). Skills partially bypass defense relative to basic
//! attacks (0.3x vs 0.5x weighting), rewarding skill investment.

use serde::{Deserialize, Serialize};

use crate::combatant::{Attribute, BattleAttributes, BattleCombatant};
use crate::math::{fixed_serde, percent, Fixed};
use crate::records::CharacterSkill;
use crate::status::StatusEffect;

/// Sentinel `aoe_radius` meaning "the caster's whole team".
pub const WHOLE_TEAM_RADIUS: u32 = 99;

/// Maximum skill level.
pub const MAX_SKILL_LEVEL: u8 = 5;

/// Cumulative usage counts at which a skill levels up.
pub const LEVEL_UP_THRESHOLDS: [u32; 4] = [5, 15, 30, 50];

/// Category of a skill, driving targeting rules.
///
/// `Cura` and `Buff` target allies; every other category targets enemies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillCategory {
    /// Single-target damage.
    Ataque,
    /// Area damage around a point.
    Aoe,
    /// Healing.
    Cura,
    /// Ally attribute boost.
    Buff,
    /// Enemy attribute reduction.
    Debuff,
    /// Control effects (stun, root).
    Controle,
}

impl SkillCategory {
    /// Whether the skill targets the caster's own team.
    #[must_use]
    pub const fn targets_allies(self) -> bool {
        matches!(self, Self::Cura | Self::Buff)
    }
}

/// Damage specification for offensive skills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageSpec {
    /// Flat base damage.
    pub base: i32,
    /// Caster attribute that scales the damage.
    pub scaling_attribute: Attribute,
    /// Multiplier applied to the scaling attribute.
    #[serde(with = "fixed_serde")]
    pub scaling_factor: Fixed,
}

/// What a skill does when it resolves, one case per shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillEffect {
    /// Deals damage, single target or AoE depending on `aoe_radius`.
    Damage(DamageSpec),
    /// Restores hit points.
    Healing {
        /// Flat healing amount before magia scaling.
        amount: u32,
    },
    /// No direct numbers; only the attached status application.
    Status,
}

/// A status effect a skill may inflict, with an application chance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusApplication {
    /// Effect template applied on success.
    pub effect: StatusEffect,
    /// Application chance in `[0, 1]`.
    #[serde(with = "fixed_serde")]
    pub chance: Fixed,
}

/// A usable ability bound to a combatant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleSkill {
    /// Stable identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Category, driving targeting.
    pub category: SkillCategory,
    /// Maximum cast range in tiles (Manhattan).
    pub range: u32,
    /// Area radius around the target point; 0 = single target,
    /// [`WHOLE_TEAM_RADIUS`] = every ally.
    pub aoe_radius: u32,
    /// Action point cost.
    pub ap_cost: u32,
    /// Uses granted per battle.
    pub max_uses_per_battle: u32,
    /// Uses left this battle; reset at battle start.
    pub current_uses: u32,
    /// What the skill does.
    pub effect: SkillEffect,
    /// Optional status rider.
    pub status_apply: Option<StatusApplication>,
    /// Lifetime use counter, drives level-ups across battles.
    pub usage_count: u32,
    /// Skill level 1..=5; only ever increases.
    pub level: u8,
}

impl BattleSkill {
    /// Magnitude multiplier for the skill's level: `1 + 0.15 * (level-1)`.
    #[must_use]
    pub fn level_multiplier(&self) -> Fixed {
        level_multiplier(self.level)
    }
}

/// Magnitude multiplier for a skill level.
#[must_use]
pub fn level_multiplier(level: u8) -> Fixed {
    let level = level.clamp(1, MAX_SKILL_LEVEL) as i64;
    Fixed::ONE + percent(15) * Fixed::from_num(level - 1)
}

/// Basic attack damage: `ataque - 0.5 * defesa + d6`, floored, minimum 1.
#[must_use]
pub fn basic_attack_damage(
    attacker: &BattleAttributes,
    defender: &BattleAttributes,
    d6: i32,
) -> u32 {
    let raw = Fixed::from_num(attacker.ataque) - Fixed::from_num(defender.defesa) / Fixed::from_num(2)
        + Fixed::from_num(d6);
    raw.floor().to_num::<i64>().max(1) as u32
}

/// Skill damage:
/// `(base + scaling_attribute * factor - 0.3 * defesa + d6) * level_mult`,
/// floored, minimum 1.
#[must_use]
pub fn skill_damage(
    spec: &DamageSpec,
    caster: &BattleAttributes,
    defender: &BattleAttributes,
    level: u8,
    d6: i32,
) -> u32 {
    let scaling = Fixed::from_num(caster.get(spec.scaling_attribute)) * spec.scaling_factor;
    let mitigation = percent(30) * Fixed::from_num(defender.defesa);
    let raw = (Fixed::from_num(spec.base) + scaling - mitigation + Fixed::from_num(d6))
        * level_multiplier(level);
    raw.floor().to_num::<i64>().max(1) as u32
}

/// Skill healing: `(amount + 0.3 * magia) * level_mult`, floored, minimum 1.
#[must_use]
pub fn skill_healing(amount: u32, caster: &BattleAttributes, level: u8) -> u32 {
    let raw = (Fixed::from_num(amount) + percent(30) * Fixed::from_num(caster.magia))
        * level_multiplier(level);
    raw.floor().to_num::<i64>().max(1) as u32
}

/// Skill level implied by a cumulative usage count.
#[must_use]
pub fn level_for_usage(usage_count: u32) -> u8 {
    let crossed = LEVEL_UP_THRESHOLDS
        .iter()
        .filter(|&&t| usage_count >= t)
        .count() as u8;
    (1 + crossed).min(MAX_SKILL_LEVEL)
}

/// Fold post-battle usage counters back into a character's persisted
/// skill list, applying level-ups at the fixed thresholds. Levels never
/// decrease. Skills the character did not already know are appended.
#[must_use]
pub fn sync_battle_skills_to_character(
    combatant: &BattleCombatant,
    existing: &[CharacterSkill],
) -> Vec<CharacterSkill> {
    let mut synced: Vec<CharacterSkill> = existing.to_vec();

    for skill in &combatant.skills {
        let level = level_for_usage(skill.usage_count).max(skill.level);
        match synced.iter_mut().find(|s| s.id == skill.id) {
            Some(entry) => {
                entry.usage_count = entry.usage_count.max(skill.usage_count);
                entry.level = entry.level.max(level);
            }
            None => synced.push(CharacterSkill {
                id: skill.id.clone(),
                name: skill.name.clone(),
                usage_count: skill.usage_count,
                level,
            }),
        }
    }

    synced
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_multiplier() {
        assert_eq!(level_multiplier(1), Fixed::ONE);
        // 1 + 0.15 * 4 = 1.6
        assert_eq!(level_multiplier(5), percent(160));
    }

    #[test]
    fn test_basic_attack_damage_formula() {
        // Spec scenario: ataque 10, defesa 4, d6 = 3 -> 10 - 2 + 3 = 11
        let attacker = BattleAttributes::new(10, 0, 0, 0, 0);
        let defender = BattleAttributes::new(0, 4, 0, 0, 0);
        assert_eq!(basic_attack_damage(&attacker, &defender, 3), 11);
    }

    #[test]
    fn test_basic_attack_damage_minimum_one() {
        let attacker = BattleAttributes::new(1, 0, 0, 0, 0);
        let defender = BattleAttributes::new(0, 50, 0, 0, 0);
        assert_eq!(basic_attack_damage(&attacker, &defender, 1), 1);
    }

    #[test]
    fn test_skill_damage_scales_with_level() {
        let spec = DamageSpec {
            base: 8,
            scaling_attribute: Attribute::Magia,
            scaling_factor: percent(50),
        };
        let caster = BattleAttributes::new(0, 0, 10, 0, 0);
        let defender = BattleAttributes::new(0, 10, 0, 0, 0);

        // 8 + 5 - 3 + 2 = 12 at level 1
        assert_eq!(skill_damage(&spec, &caster, &defender, 1, 2), 12);
        // 12 * 1.15 = 13.8, floored to 13 at level 2
        assert_eq!(skill_damage(&spec, &caster, &defender, 2, 2), 13);
    }

    #[test]
    fn test_skill_healing() {
        let caster = BattleAttributes::new(0, 0, 10, 0, 0);
        // 12 + 3 = 15 at level 1
        assert_eq!(skill_healing(12, &caster, 1), 15);
    }

    #[test]
    fn test_level_for_usage_thresholds() {
        assert_eq!(level_for_usage(0), 1);
        assert_eq!(level_for_usage(4), 1);
        assert_eq!(level_for_usage(5), 2);
        assert_eq!(level_for_usage(15), 3);
        assert_eq!(level_for_usage(30), 4);
        assert_eq!(level_for_usage(50), 5);
        assert_eq!(level_for_usage(1000), 5);
    }
}
