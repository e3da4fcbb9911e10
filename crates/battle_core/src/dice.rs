//! Strategic dice-roll boost system.
//!
//! Each player combatant carries a small per-battle pool of dice rolls.
//! A roll is declared before the boosted action executes; the host then
//! executes the action and calls [`BattleState::apply_dice_roll_to_action`]
//! to retroactively scale the most recent log entry and re-apply the HP
//! delta. The two-phase shape lets presentation play a dice animation
//! before committing numbers.

use serde::{Deserialize, Serialize};

use crate::battle::BattleState;
use crate::combatant::Attribute;
use crate::error::{BattleError, Result};
use crate::math::{fixed_serde, percent, round_at_least, Fixed};
use crate::rng::DiceRoller;

/// What the pending boosted action is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DicePurpose {
    /// Boosting a basic attack.
    Attack,
    /// Boosting a defend stance.
    Defense,
    /// Boosting a skill.
    Skill,
    /// Boosting a move.
    Move,
}

impl DicePurpose {
    /// The attribute that eases the roll's difficulty.
    #[must_use]
    pub const fn attribute(self) -> Attribute {
        match self {
            Self::Attack => Attribute::Ataque,
            Self::Defense => Attribute::Defesa,
            Self::Skill => Attribute::Magia,
            Self::Move => Attribute::Agilidade,
        }
    }
}

/// Resolution of one d20 dice roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceRollOutcome {
    /// What the roll boosts.
    pub purpose: DicePurpose,
    /// The raw d20 result, 1..=20.
    pub roll: i32,
    /// Threshold the roll had to meet.
    pub difficulty: i32,
    /// Whether the roll met the threshold (a 20 always does, a 1 never).
    pub success: bool,
    /// Natural 20.
    pub is_crit: bool,
    /// Natural 1.
    pub is_critical_failure: bool,
    /// Scale applied to the boosted action's damage or healing.
    #[serde(with = "fixed_serde")]
    pub multiplier: Fixed,
}

impl BattleState {
    /// Roll a d20 against a difficulty derived from the purpose's attribute.
    ///
    /// `difficulty = max(5, round(15 - attribute/3))`. A natural 20 is
    /// always a critical success (2.0x), a natural 1 always a critical
    /// failure (0.5x); otherwise success at or above the difficulty
    /// (1.5x), failure below (0.75x). Does not consume the pool; the
    /// pool is spent when the roll is applied.
    pub fn perform_dice_roll(
        &self,
        combatant_id: &str,
        purpose: DicePurpose,
        dice: &mut dyn DiceRoller,
    ) -> Result<DiceRollOutcome> {
        let combatant = self.combatant(combatant_id)?;
        if combatant.dice_rolls_remaining == 0 {
            return Err(BattleError::NoDiceRolls);
        }

        let attribute = combatant.effective_attributes().get(purpose.attribute());
        let difficulty = round_at_least(
            Fixed::from_num(15) - Fixed::from_num(attribute) / Fixed::from_num(3),
            5,
        )
        .max(5) as i32;

        let roll = dice.d20();
        let is_crit = roll == 20;
        let is_critical_failure = roll == 1;
        let success = is_crit || (!is_critical_failure && roll >= difficulty);

        let multiplier = if is_crit {
            percent(200)
        } else if is_critical_failure {
            percent(50)
        } else if success {
            percent(150)
        } else {
            percent(75)
        };

        tracing::debug!(combatant = %combatant_id, ?purpose, roll, difficulty, "dice roll");
        Ok(DiceRollOutcome {
            purpose,
            roll,
            difficulty,
            success,
            is_crit,
            is_critical_failure,
            multiplier,
        })
    }

    /// Retroactively scale the most recent log entry by a dice outcome.
    ///
    /// Re-applies the damage or healing delta to the entry's target,
    /// updates the entry's numbers and crit flag, spends one roll from
    /// the pool, and re-checks the terminal condition.
    pub fn apply_dice_roll_to_action(
        &mut self,
        combatant_id: &str,
        outcome: &DiceRollOutcome,
        dice: &mut dyn DiceRoller,
    ) -> Result<()> {
        if self.phase.is_terminal() {
            return Err(BattleError::BattleOver);
        }
        let combatant = self.combatant(combatant_id)?;
        if combatant.dice_rolls_remaining == 0 {
            return Err(BattleError::NoDiceRolls);
        }
        let entry_index = self.log.len().checked_sub(1).ok_or(BattleError::MissingTarget)?;

        let entry = &self.log[entry_index];
        let target_id = entry.target_id.clone();
        let old_damage = entry.damage;
        let old_healing = entry.healing;

        let mut new_kill = false;
        if let Some(target_id) = &target_id {
            if let Some(old) = old_damage {
                let new = round_at_least(Fixed::from_num(old) * outcome.multiplier, 1) as u32;
                let target = self.combatant_mut(target_id)?;
                if new >= old {
                    target.hp = target.hp.saturating_sub(new - old);
                } else {
                    target.hp = (target.hp + (old - new)).min(target.max_hp);
                }
                new_kill = !target.is_alive();
                self.log[entry_index].damage = Some(new);
            } else if let Some(old) = old_healing {
                let new = round_at_least(Fixed::from_num(old) * outcome.multiplier, 0) as u32;
                let target = self.combatant_mut(target_id)?;
                if new >= old {
                    target.hp = (target.hp + (new - old)).min(target.max_hp);
                } else {
                    target.hp = target.hp.saturating_sub(old - new);
                }
                self.log[entry_index].healing = Some(new);
            }
        }

        let entry = &mut self.log[entry_index];
        entry.is_crit = outcome.is_crit;
        if new_kill {
            entry.is_kill = true;
        }

        self.combatant_mut(combatant_id)?.dice_rolls_remaining -= 1;
        self.check_battle_end(dice)?;
        self.touch();
        Ok(())
    }
}
