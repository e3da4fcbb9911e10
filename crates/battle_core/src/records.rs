//! Input records owned by external collaborators.
//!
//! Characters and enemies arrive as plain data from the setup and
//! persistence layers. The engine maps them into [`BattleCombatant`]s
//! once at battle creation and never reads them again; progression flows
//! back out through [`crate::skill::sync_battle_skills_to_character`].

use serde::{Deserialize, Serialize};

use crate::ai::AiPattern;
use crate::combatant::{BattleAttributes, BattleCombatant, Team};
use crate::grid::GridPosition;
use crate::skill::BattleSkill;

/// Dice rolls granted to each player combatant per battle.
pub const DICE_ROLL_POOL: u32 = 2;

/// Action points granted per turn when the record does not say otherwise.
pub const DEFAULT_ACTION_POINTS: u32 = 3;

/// A character's persisted progress on one skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterSkill {
    /// Skill identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Cumulative lifetime uses.
    pub usage_count: u32,
    /// Skill level 1..=5.
    pub level: u8,
}

/// A piece of equipment granting flat attribute bonuses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquippedItem {
    /// Item identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Flat attribute bonuses while equipped.
    pub bonus: BattleAttributes,
}

/// A player character record, owned by the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    /// Stable identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Class label owned by the character sheet; the engine never reads it.
    pub archetype: String,
    /// Character level owned by the progression layer; the engine never
    /// reads it.
    pub level: u32,
    /// Portrait image for the presentation layer; the engine never reads it.
    pub portrait_url: Option<String>,
    /// Current hit points carried into battle.
    pub hp: u32,
    /// Maximum hit points.
    pub max_hp: u32,
    /// Base battle attributes.
    pub attributes: BattleAttributes,
    /// Equipped items; bonuses are summed flat.
    pub equipment: Vec<EquippedItem>,
    /// Known skills, with persisted usage/level already folded in.
    pub skills: Vec<BattleSkill>,
}

impl Character {
    /// Map the record into a fresh battle combatant at `position`.
    ///
    /// Per-battle counters reset here: skill uses back to the per-battle
    /// maximum, full action points, and the dice-roll pool.
    #[must_use]
    pub fn to_combatant(&self, position: GridPosition) -> BattleCombatant {
        let mut equipment_bonus = BattleAttributes::default();
        for item in &self.equipment {
            equipment_bonus.ataque += item.bonus.ataque;
            equipment_bonus.defesa += item.bonus.defesa;
            equipment_bonus.magia += item.bonus.magia;
            equipment_bonus.velocidade += item.bonus.velocidade;
            equipment_bonus.agilidade += item.bonus.agilidade;
        }

        BattleCombatant {
            id: self.id.clone(),
            name: self.name.clone(),
            team: Team::Player,
            position,
            hp: self.hp.min(self.max_hp),
            max_hp: self.max_hp,
            attributes: self.attributes,
            equipment_bonus,
            effects: Vec::new(),
            action_points: DEFAULT_ACTION_POINTS,
            max_action_points: DEFAULT_ACTION_POINTS,
            skills: reset_skill_uses(&self.skills),
            is_defending: false,
            has_attacked: false,
            has_defended: false,
            dice_rolls_remaining: DICE_ROLL_POOL,
            ai_pattern: None,
        }
    }
}

/// An enemy template record, owned by the setup collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    /// Template identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Template level owned by the setup layer; the engine never reads it.
    pub level: u32,
    /// Portrait image for the presentation layer; the engine never reads it.
    pub portrait_url: Option<String>,
    /// Current hit points.
    pub hp: u32,
    /// Maximum hit points.
    pub max_hp: u32,
    /// Base battle attributes.
    pub attributes: BattleAttributes,
    /// Skills available to this enemy.
    pub skills: Vec<BattleSkill>,
    /// Decision policy for this enemy's turns.
    pub ai_pattern: AiPattern,
}

impl Enemy {
    /// Map the template into a battle combatant.
    ///
    /// `instance_id` must be unique within the battle; the same template
    /// may spawn several combatants.
    #[must_use]
    pub fn to_combatant(&self, instance_id: impl Into<String>, position: GridPosition) -> BattleCombatant {
        BattleCombatant {
            id: instance_id.into(),
            name: self.name.clone(),
            team: Team::Enemy,
            position,
            hp: self.hp.min(self.max_hp),
            max_hp: self.max_hp,
            attributes: self.attributes,
            equipment_bonus: BattleAttributes::default(),
            effects: Vec::new(),
            action_points: DEFAULT_ACTION_POINTS,
            max_action_points: DEFAULT_ACTION_POINTS,
            skills: reset_skill_uses(&self.skills),
            is_defending: false,
            has_attacked: false,
            has_defended: false,
            dice_rolls_remaining: 0,
            ai_pattern: Some(self.ai_pattern),
        }
    }
}

fn reset_skill_uses(skills: &[BattleSkill]) -> Vec<BattleSkill> {
    skills
        .iter()
        .map(|s| {
            let mut skill = s.clone();
            skill.current_uses = skill.max_uses_per_battle;
            skill
        })
        .collect()
}
