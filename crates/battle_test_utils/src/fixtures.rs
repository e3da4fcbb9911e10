//! Test fixtures and helpers.
//!
//! Pre-built rosters, skills, a scripted dice source, and an autoplay
//! driver for consistent testing across crates.

use std::collections::VecDeque;

use battle_core::ai::enemy_turn_actions;
use battle_core::battle::{create_battle, BattleState};
use battle_core::error::Result;
use battle_core::math::{percent, Fixed};
use battle_core::prelude::*;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> Fixed {
    Fixed::from_num(n)
}

/// Dice source replaying scripted values, with fallback defaults.
///
/// Tests queue the exact rolls they want to assert against; once a queue
/// drains, the corresponding default is returned forever.
#[derive(Debug, Clone)]
pub struct ScriptedDice {
    d6_queue: VecDeque<i32>,
    d20_queue: VecDeque<i32>,
    fraction_queue: VecDeque<Fixed>,
    default_d6: i32,
    default_d20: i32,
    default_fraction: Fixed,
}

impl ScriptedDice {
    /// Dice with empty queues and mid-range defaults (d6=3, d20=10,
    /// fraction=0.99 so chance-gated effects never fire by accident).
    #[must_use]
    pub fn new() -> Self {
        Self {
            d6_queue: VecDeque::new(),
            d20_queue: VecDeque::new(),
            fraction_queue: VecDeque::new(),
            default_d6: 3,
            default_d20: 10,
            default_fraction: percent(99),
        }
    }

    /// Builder method to queue d6 results.
    #[must_use]
    pub fn with_d6(mut self, values: &[i32]) -> Self {
        self.d6_queue.extend(values);
        self
    }

    /// Builder method to queue d20 results.
    #[must_use]
    pub fn with_d20(mut self, values: &[i32]) -> Self {
        self.d20_queue.extend(values);
        self
    }

    /// Builder method to queue fraction draws.
    #[must_use]
    pub fn with_fractions(mut self, values: &[Fixed]) -> Self {
        self.fraction_queue.extend(values);
        self
    }

    /// Builder method to change the d6 fallback.
    #[must_use]
    pub fn default_d6(mut self, value: i32) -> Self {
        self.default_d6 = value;
        self
    }

    /// Builder method to change the fraction fallback.
    #[must_use]
    pub fn default_fraction(mut self, value: Fixed) -> Self {
        self.default_fraction = value;
        self
    }
}

impl Default for ScriptedDice {
    fn default() -> Self {
        Self::new()
    }
}

impl DiceRoller for ScriptedDice {
    fn d6(&mut self) -> i32 {
        self.d6_queue.pop_front().unwrap_or(self.default_d6)
    }

    fn d20(&mut self) -> i32 {
        self.d20_queue.pop_front().unwrap_or(self.default_d20)
    }

    fn fraction(&mut self) -> Fixed {
        self.fraction_queue.pop_front().unwrap_or(self.default_fraction)
    }
}

/// A single-target damaging skill scaling with magia.
#[must_use]
pub fn strike_skill() -> BattleSkill {
    BattleSkill {
        id: "golpe-arcano".into(),
        name: "Golpe Arcano".into(),
        category: SkillCategory::Ataque,
        range: 3,
        aoe_radius: 0,
        ap_cost: 2,
        max_uses_per_battle: 3,
        current_uses: 3,
        effect: SkillEffect::Damage(DamageSpec {
            base: 8,
            scaling_attribute: Attribute::Magia,
            scaling_factor: percent(50),
        }),
        status_apply: None,
        usage_count: 0,
        level: 1,
    }
}

/// A single-target heal scaling with magia.
#[must_use]
pub fn heal_skill() -> BattleSkill {
    BattleSkill {
        id: "cura-leve".into(),
        name: "Cura Leve".into(),
        category: SkillCategory::Cura,
        range: 4,
        aoe_radius: 0,
        ap_cost: 2,
        max_uses_per_battle: 3,
        current_uses: 3,
        effect: SkillEffect::Healing { amount: 12 },
        status_apply: None,
        usage_count: 0,
        level: 1,
    }
}

/// A stacking poison status template.
#[must_use]
pub fn poison_effect() -> StatusEffect {
    StatusEffect::new(
        "veneno",
        "Veneno",
        StatusKind::DamageOverTime { damage_per_turn: 3 },
        2,
    )
    .with_stacking(3)
}

/// A player character with the standard fixture skills.
#[must_use]
pub fn hero(id: &str, name: &str) -> Character {
    Character {
        id: id.into(),
        name: name.into(),
        archetype: "aventureiro".into(),
        level: 1,
        portrait_url: None,
        hp: 30,
        max_hp: 30,
        attributes: BattleAttributes::new(10, 8, 8, 12, 7),
        equipment: Vec::new(),
        skills: vec![strike_skill(), heal_skill()],
    }
}

/// An enemy template with the given decision policy.
#[must_use]
pub fn goblin(id: &str, name: &str, pattern: AiPattern) -> Enemy {
    Enemy {
        id: id.into(),
        name: name.into(),
        level: 1,
        portrait_url: None,
        hp: 18,
        max_hp: 18,
        attributes: BattleAttributes::new(7, 4, 2, 9, 5),
        skills: Vec::new(),
        ai_pattern: pattern,
    }
}

/// A begun 2v2 battle on all-normal terrain.
#[must_use]
pub fn demo_battle() -> BattleState {
    let mut state = create_battle(
        "mundo-teste",
        "clareira",
        &[hero("ana", "Ana"), hero("bruno", "Bruno")],
        &[
            goblin("goblin", "Goblin", AiPattern::Aggressive),
            goblin("lobo", "Lobo", AiPattern::Coward),
        ],
    );
    state.begin().expect("fresh battle begins");
    state
}

/// Drive a battle to completion with both sides planned by the AI.
///
/// Each turn is planned with [`enemy_turn_actions`] and executed action
/// by action. A plan step rejected mid-sequence (the snapshot it was
/// planned from is stale by then) is skipped; rejections never mutate
/// state. Stops when the battle ends or `max_rounds` passes.
pub fn autoplay(state: &mut BattleState, dice: &mut dyn DiceRoller, max_rounds: u32) -> Result<()> {
    if state.phase == BattlePhase::Intro {
        state.begin()?;
    }
    while !state.phase.is_terminal() && state.round <= max_rounds {
        let Some(id) = state.current_combatant_id().map(str::to_string) else {
            break;
        };
        let actions = enemy_turn_actions(state, &id)?;
        for action in &actions {
            if state.phase.is_terminal() {
                break;
            }
            let _ = state.execute(action, dice);
        }
        if state.phase.is_terminal() {
            break;
        }
        state.advance_turn(dice)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_dice_replays_then_falls_back() {
        let mut dice = ScriptedDice::new().with_d6(&[1, 2]).with_d20(&[20]);
        assert_eq!(dice.d6(), 1);
        assert_eq!(dice.d6(), 2);
        assert_eq!(dice.d6(), 3); // default
        assert_eq!(dice.d20(), 20);
        assert_eq!(dice.d20(), 10); // default
    }

    #[test]
    fn test_demo_battle_is_playable() {
        let state = demo_battle();
        assert_eq!(state.combatants.len(), 4);
        assert!(!state.phase.is_terminal());
        assert!(state.current_combatant_id().is_some());
    }

    #[test]
    fn test_autoplay_reaches_a_terminal_phase() {
        let mut state = demo_battle();
        let mut dice = SeededDice::from_seed(11);
        autoplay(&mut state, &mut dice, 50).unwrap();
        assert!(state.phase.is_terminal());
    }
}
