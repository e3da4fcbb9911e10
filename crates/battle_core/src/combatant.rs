//! Combatant model and layered attribute computation.
//!
//! A combatant's effective attributes are recomputed on demand: base
//! stats, then flat equipment bonuses, then status modifiers in
//! application order (percent multiplicative, flat additive), then the
//! defending bonus, clamped at zero. Never cached - effects expire
//! mid-battle.

use serde::{Deserialize, Serialize};

use crate::ai::AiPattern;
use crate::grid::GridPosition;
use crate::math::Fixed;
use crate::skill::BattleSkill;
use crate::status::{ControlKind, ModifierValue, StatusEffect, StatusKind};

/// Defense bonus while defending: +50%.
const DEFENDING_BONUS: i64 = 50;

/// Which side a combatant fights for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    /// Player-controlled hero.
    Player,
    /// AI-controlled enemy.
    Enemy,
}

impl Team {
    /// The opposing team.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Player => Self::Enemy,
            Self::Enemy => Self::Player,
        }
    }
}

/// One of the five battle attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attribute {
    /// Physical attack power.
    Ataque,
    /// Damage mitigation.
    Defesa,
    /// Magical power, scales skill healing.
    Magia,
    /// Speed: turn order and flee chance.
    Velocidade,
    /// Agility: movement dice rolls.
    Agilidade,
}

/// The full set of battle attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BattleAttributes {
    /// Physical attack power.
    pub ataque: i32,
    /// Damage mitigation.
    pub defesa: i32,
    /// Magical power.
    pub magia: i32,
    /// Speed.
    pub velocidade: i32,
    /// Agility.
    pub agilidade: i32,
}

impl BattleAttributes {
    /// Create attributes with every value set explicitly.
    #[must_use]
    pub const fn new(ataque: i32, defesa: i32, magia: i32, velocidade: i32, agilidade: i32) -> Self {
        Self {
            ataque,
            defesa,
            magia,
            velocidade,
            agilidade,
        }
    }

    /// Read one attribute by name.
    #[must_use]
    pub const fn get(&self, attribute: Attribute) -> i32 {
        match attribute {
            Attribute::Ataque => self.ataque,
            Attribute::Defesa => self.defesa,
            Attribute::Magia => self.magia,
            Attribute::Velocidade => self.velocidade,
            Attribute::Agilidade => self.agilidade,
        }
    }
}

/// One participant in a battle: a player hero or an enemy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleCombatant {
    /// Stable identity, unique within the battle.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Side this combatant fights for.
    pub team: Team,
    /// Current board position.
    pub position: GridPosition,
    /// Current hit points, in `[0, max_hp]`.
    pub hp: u32,
    /// Maximum hit points.
    pub max_hp: u32,
    /// Base battle attributes before any layering.
    pub attributes: BattleAttributes,
    /// Flat bonuses from equipped items.
    pub equipment_bonus: BattleAttributes,
    /// Active status effects, in application order.
    pub effects: Vec<StatusEffect>,
    /// Action points left this turn.
    pub action_points: u32,
    /// Action point budget granted each turn.
    pub max_action_points: u32,
    /// Usable skills with per-battle counters.
    pub skills: Vec<BattleSkill>,
    /// Defending stance, cleared at the owner's next turn start.
    pub is_defending: bool,
    /// Whether an attack-class action was taken this turn.
    pub has_attacked: bool,
    /// Whether the defend action was taken this turn.
    pub has_defended: bool,
    /// Strategic dice rolls left in the per-battle pool.
    pub dice_rolls_remaining: u32,
    /// Decision policy for enemies; `None` for player heroes.
    pub ai_pattern: Option<AiPattern>,
}

impl BattleCombatant {
    /// Whether the combatant is still standing.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Compute effective attributes by layering, in order:
    /// base, flat equipment bonuses, status modifiers (percent
    /// multiplicative on the then-current value, flat additive),
    /// the +50% defense bonus while defending, and a clamp at zero.
    #[must_use]
    pub fn effective_attributes(&self) -> BattleAttributes {
        let mut values = [
            (Attribute::Ataque, self.layered_base(Attribute::Ataque)),
            (Attribute::Defesa, self.layered_base(Attribute::Defesa)),
            (Attribute::Magia, self.layered_base(Attribute::Magia)),
            (Attribute::Velocidade, self.layered_base(Attribute::Velocidade)),
            (Attribute::Agilidade, self.layered_base(Attribute::Agilidade)),
        ];

        for effect in &self.effects {
            let modifier = match &effect.kind {
                StatusKind::Buff(m) | StatusKind::Debuff(m) => *m,
                _ => continue,
            };
            for (attribute, value) in &mut values {
                if *attribute != modifier.attribute {
                    continue;
                }
                for _ in 0..effect.current_stacks.max(1) {
                    match modifier.value {
                        ModifierValue::Percent(fraction) => {
                            *value *= Fixed::ONE + fraction;
                        }
                        ModifierValue::Flat(amount) => {
                            *value += Fixed::from_num(amount);
                        }
                    }
                }
            }
        }

        if self.is_defending {
            values[1].1 *= Fixed::ONE + Fixed::from_num(DEFENDING_BONUS) / Fixed::from_num(100);
        }

        let clamp = |v: Fixed| v.floor().to_num::<i32>().max(0);
        BattleAttributes {
            ataque: clamp(values[0].1),
            defesa: clamp(values[1].1),
            magia: clamp(values[2].1),
            velocidade: clamp(values[3].1),
            agilidade: clamp(values[4].1),
        }
    }

    fn layered_base(&self, attribute: Attribute) -> Fixed {
        Fixed::from_num(self.attributes.get(attribute) + self.equipment_bonus.get(attribute))
    }

    /// Effective speed, the turn-order key.
    #[must_use]
    pub fn effective_speed(&self) -> i32 {
        self.effective_attributes().velocidade
    }

    /// Whether an active control effect of the given kind is present.
    #[must_use]
    pub fn has_control(&self, kind: ControlKind) -> bool {
        self.effects.iter().any(|e| e.control_kind() == Some(kind))
    }

    /// Find a skill by id.
    #[must_use]
    pub fn skill(&self, skill_id: &str) -> Option<&BattleSkill> {
        self.skills.iter().find(|s| s.id == skill_id)
    }

    /// Find a skill by id, mutably.
    pub fn skill_mut(&mut self, skill_id: &str) -> Option<&mut BattleSkill> {
        self.skills.iter_mut().find(|s| s.id == skill_id)
    }
}
