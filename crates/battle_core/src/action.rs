//! Action execution state machine.
//!
//! Turn state lives in combatant flags rather than a separate enum:
//! `has_attacked`, `has_defended`, `action_points`. Every precondition is
//! checked before the first mutation, so a rejected action provably
//! leaves the state untouched.

use serde::{Deserialize, Serialize};

use crate::battle::{BattleLogEntry, BattlePhase, BattleState, LogKind, HEALING_POTION_ID};
use crate::combatant::Team;
use crate::error::{BattleError, Result};
use crate::grid::{aoe_area, GridPosition, TileType, HAZARD_DAMAGE};
use crate::math::{percent, Fixed};
use crate::rng::DiceRoller;
use crate::skill::{
    basic_attack_damage, skill_damage, skill_healing, SkillEffect, WHOLE_TEAM_RADIUS,
};
use crate::status::apply_status;

/// HP restored by the built-in healing potion.
const POTION_HEAL: u32 = 10;

/// A command submitted for execution by the acting combatant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleAction {
    /// Reposition to a reachable tile.
    Move {
        /// Acting combatant id.
        actor: String,
        /// Destination tile.
        to: GridPosition,
    },
    /// Basic attack against an adjacent target.
    Attack {
        /// Acting combatant id.
        actor: String,
        /// Target combatant id.
        target: String,
    },
    /// Take a defensive stance until the next own turn.
    Defend {
        /// Acting combatant id.
        actor: String,
    },
    /// Use a skill against a target or a tile.
    Skill {
        /// Acting combatant id.
        actor: String,
        /// Skill to use.
        skill_id: String,
        /// Target combatant, when the skill targets one.
        target: Option<String>,
        /// Anchor tile, for area skills aimed at the ground.
        target_position: Option<GridPosition>,
    },
    /// Use an item.
    Item {
        /// Acting combatant id.
        actor: String,
        /// Item to consume.
        item_id: String,
    },
    /// Attempt to flee the battle.
    Flee {
        /// Acting combatant id.
        actor: String,
    },
    /// Give up the rest of the turn.
    EndTurn {
        /// Acting combatant id.
        actor: String,
    },
}

impl BattleAction {
    /// The acting combatant's id.
    #[must_use]
    pub fn actor(&self) -> &str {
        match self {
            Self::Move { actor, .. }
            | Self::Attack { actor, .. }
            | Self::Defend { actor }
            | Self::Skill { actor, .. }
            | Self::Item { actor, .. }
            | Self::Flee { actor }
            | Self::EndTurn { actor } => actor,
        }
    }
}

impl BattleState {
    /// Execute one action for the acting combatant.
    ///
    /// Rejections are typed and guaranteed to leave the state unchanged.
    /// At most one attack-class action (attack or skill) per turn, and
    /// defending is mutually exclusive with attacking in the same turn.
    pub fn execute(&mut self, action: &BattleAction, dice: &mut dyn DiceRoller) -> Result<()> {
        if self.phase.is_terminal() {
            return Err(BattleError::BattleOver);
        }
        if self.phase == BattlePhase::Intro {
            return Err(BattleError::NotStarted);
        }

        let actor_id = action.actor().to_string();
        let actor = self.combatant(&actor_id)?;
        if !actor.is_alive() {
            return Err(BattleError::CombatantDefeated(actor_id));
        }
        if self.current_combatant_id() != Some(actor_id.as_str()) {
            return Err(BattleError::OutOfTurn(actor_id));
        }

        tracing::debug!(actor = %actor_id, ?action, "executing action");
        match action {
            BattleAction::Move { actor, to } => self.execute_move(actor, *to, dice),
            BattleAction::Attack { actor, target } => self.execute_attack(actor, target, dice),
            BattleAction::Defend { actor } => self.execute_defend(actor),
            BattleAction::Skill {
                actor,
                skill_id,
                target,
                target_position,
            } => self.execute_skill(actor, skill_id, target.as_deref(), *target_position, dice),
            BattleAction::Item { actor, item_id } => self.execute_item(actor, item_id),
            BattleAction::Flee { actor } => self.execute_flee(actor, dice),
            BattleAction::EndTurn { actor } => self.execute_end_turn(actor),
        }
    }

    fn execute_move(
        &mut self,
        actor_id: &str,
        to: GridPosition,
        dice: &mut dyn DiceRoller,
    ) -> Result<()> {
        let actor = self.combatant(actor_id)?;
        if actor.has_control(crate::status::ControlKind::Root) {
            return Err(BattleError::Rooted);
        }
        let available = actor.action_points;
        if available < 1 {
            return Err(BattleError::InsufficientActionPoints {
                required: 1,
                available,
            });
        }
        let from = actor.position;
        let reachable = self.movement_range(actor_id)?;
        if !reachable.contains(&to) {
            return Err(BattleError::Unreachable {
                col: to.col,
                row: to.row,
            });
        }
        let cost = from.manhattan(to).max(1);
        if cost > available {
            return Err(BattleError::InsufficientActionPoints {
                required: cost,
                available,
            });
        }

        let round = self.round;
        let on_hazard = self.terrain.tile(to) == Some(TileType::Hazard);
        let actor = self.combatant_mut(actor_id)?;
        let name = actor.name.clone();
        actor.position = to;
        actor.action_points -= cost;

        self.push_log(BattleLogEntry::new(
            round,
            actor_id,
            name.clone(),
            LogKind::Move,
            format!("{name} move-se para ({}, {}).", to.col, to.row),
        ));

        if on_hazard {
            let actor = self.combatant_mut(actor_id)?;
            actor.hp = actor.hp.saturating_sub(HAZARD_DAMAGE);
            let is_kill = !actor.is_alive();
            let mut entry = BattleLogEntry::new(
                round,
                actor_id,
                name.clone(),
                LogKind::Status,
                format!("{name} sofre {HAZARD_DAMAGE} de dano do terreno."),
            )
            .with_damage(HAZARD_DAMAGE);
            entry.is_kill = is_kill;
            self.push_log(entry);
            self.check_battle_end(dice)?;
        }

        self.touch();
        Ok(())
    }

    fn execute_attack(
        &mut self,
        actor_id: &str,
        target_id: &str,
        dice: &mut dyn DiceRoller,
    ) -> Result<()> {
        let actor = self.combatant(actor_id)?;
        if actor.action_points < 1 {
            return Err(BattleError::InsufficientActionPoints {
                required: 1,
                available: actor.action_points,
            });
        }
        if actor.has_attacked || actor.has_defended {
            return Err(BattleError::AlreadyActed);
        }
        let target = self.combatant(target_id)?;
        if !target.is_alive() {
            return Err(BattleError::MissingTarget);
        }
        let distance = actor.position.manhattan(target.position);
        if distance > 1 {
            return Err(BattleError::OutOfRange { distance, range: 1 });
        }

        let attacker_attrs = actor.effective_attributes();
        let defender_attrs = target.effective_attributes();
        let damage = basic_attack_damage(&attacker_attrs, &defender_attrs, dice.d6());

        let round = self.round;
        let actor_name = self.combatant(actor_id)?.name.clone();
        let target_name = target.name.clone();

        let actor = self.combatant_mut(actor_id)?;
        actor.has_attacked = true;
        actor.action_points -= 1;

        let target = self.combatant_mut(target_id)?;
        target.hp = target.hp.saturating_sub(damage);
        let is_kill = !target.is_alive();

        let mut entry = BattleLogEntry::new(
            round,
            actor_id,
            actor_name.clone(),
            LogKind::Attack,
            format!("{actor_name} ataca {target_name} causando {damage} de dano."),
        )
        .with_target(target_id, target_name)
        .with_damage(damage);
        entry.is_kill = is_kill;
        self.push_log(entry);

        self.check_battle_end(dice)?;
        self.touch();
        Ok(())
    }

    fn execute_defend(&mut self, actor_id: &str) -> Result<()> {
        let actor = self.combatant(actor_id)?;
        if actor.action_points < 1 {
            return Err(BattleError::InsufficientActionPoints {
                required: 1,
                available: actor.action_points,
            });
        }
        if actor.has_attacked || actor.has_defended {
            return Err(BattleError::AlreadyActed);
        }

        let round = self.round;
        let actor = self.combatant_mut(actor_id)?;
        let name = actor.name.clone();
        actor.is_defending = true;
        actor.has_defended = true;
        actor.action_points -= 1;

        self.push_log(BattleLogEntry::new(
            round,
            actor_id,
            name.clone(),
            LogKind::Defend,
            format!("{name} assume postura defensiva."),
        ));
        self.touch();
        Ok(())
    }

    fn execute_skill(
        &mut self,
        actor_id: &str,
        skill_id: &str,
        target: Option<&str>,
        target_position: Option<GridPosition>,
        dice: &mut dyn DiceRoller,
    ) -> Result<()> {
        let actor = self.combatant(actor_id)?;
        let skill = actor
            .skill(skill_id)
            .ok_or_else(|| BattleError::SkillNotFound(skill_id.to_string()))?
            .clone();
        if skill.current_uses == 0 {
            return Err(BattleError::SkillExhausted(skill_id.to_string()));
        }
        if actor.action_points < skill.ap_cost {
            return Err(BattleError::InsufficientActionPoints {
                required: skill.ap_cost,
                available: actor.action_points,
            });
        }
        if actor.has_attacked || actor.has_defended {
            return Err(BattleError::AlreadyActed);
        }

        let target_ids = self.resolve_skill_targets(actor_id, &skill, target, target_position)?;

        // All preconditions hold; mutate.
        let round = self.round;
        let caster_attrs = self.combatant(actor_id)?.effective_attributes();
        let actor_name = self.combatant(actor_id)?.name.clone();

        {
            let actor = self.combatant_mut(actor_id)?;
            actor.has_attacked = true;
            actor.action_points -= skill.ap_cost;
            let bound = actor
                .skill_mut(skill_id)
                .ok_or_else(|| BattleError::SkillNotFound(skill_id.to_string()))?;
            bound.current_uses -= 1;
            bound.usage_count += 1;
        }

        for target_id in &target_ids {
            let defender_attrs = self.combatant(target_id)?.effective_attributes();
            let mut entry = BattleLogEntry::new(
                round,
                actor_id,
                actor_name.clone(),
                LogKind::Skill,
                String::new(),
            );
            let target_name = self.combatant(target_id)?.name.clone();
            entry = entry.with_target(target_id.clone(), target_name.clone());

            match &skill.effect {
                SkillEffect::Damage(spec) => {
                    let damage =
                        skill_damage(spec, &caster_attrs, &defender_attrs, skill.level, dice.d6());
                    let victim = self.combatant_mut(target_id)?;
                    victim.hp = victim.hp.saturating_sub(damage);
                    entry.is_kill = !victim.is_alive();
                    entry.damage = Some(damage);
                    entry.summary = format!(
                        "{actor_name} usa {} em {target_name} causando {damage} de dano.",
                        skill.name
                    );
                }
                SkillEffect::Healing { amount } => {
                    let healing = skill_healing(*amount, &caster_attrs, skill.level);
                    let ally = self.combatant_mut(target_id)?;
                    ally.hp = (ally.hp + healing).min(ally.max_hp);
                    entry.healing = Some(healing);
                    entry.summary = format!(
                        "{actor_name} usa {} em {target_name} curando {healing} de vida.",
                        skill.name
                    );
                }
                SkillEffect::Status => {
                    entry.summary =
                        format!("{actor_name} usa {} em {target_name}.", skill.name);
                }
            }

            if let Some(rider) = &skill.status_apply {
                if dice.fraction() < rider.chance {
                    let victim = self.combatant_mut(target_id)?;
                    if victim.is_alive() {
                        apply_status(&mut victim.effects, &rider.effect);
                        entry.status_applied = Some(rider.effect.id.clone());
                    }
                }
            }

            self.push_log(entry);
        }

        self.check_battle_end(dice)?;
        self.touch();
        Ok(())
    }

    /// Resolve the living combatants a skill will affect, in roster order.
    ///
    /// Ally-targeted skills (cura, buff) hit the whole team when
    /// `aoe_radius` is the whole-team sentinel, the explicit target
    /// otherwise, falling back to the caster. Enemy-targeted skills anchor
    /// on the target combatant or tile and expand to the AoE area when
    /// `aoe_radius > 0`.
    fn resolve_skill_targets(
        &self,
        actor_id: &str,
        skill: &crate::skill::BattleSkill,
        target: Option<&str>,
        target_position: Option<GridPosition>,
    ) -> Result<Vec<String>> {
        let actor = self.combatant(actor_id)?;

        if skill.category.targets_allies() {
            if skill.aoe_radius == WHOLE_TEAM_RADIUS {
                return Ok(self
                    .living_on_team(actor.team)
                    .iter()
                    .map(|c| c.id.clone())
                    .collect());
            }
            let target_id = target.unwrap_or(actor_id);
            let ally = self.combatant(target_id)?;
            if !ally.is_alive() || ally.team != actor.team {
                return Err(BattleError::MissingTarget);
            }
            let distance = actor.position.manhattan(ally.position);
            if distance > skill.range {
                return Err(BattleError::OutOfRange {
                    distance,
                    range: skill.range,
                });
            }
            return Ok(vec![ally.id.clone()]);
        }

        let anchor = match target {
            Some(target_id) => {
                let enemy = self.combatant(target_id)?;
                if !enemy.is_alive() {
                    return Err(BattleError::MissingTarget);
                }
                enemy.position
            }
            None => target_position.ok_or(BattleError::MissingTarget)?,
        };
        let distance = actor.position.manhattan(anchor);
        if distance > skill.range {
            return Err(BattleError::OutOfRange {
                distance,
                range: skill.range,
            });
        }

        let opponents = actor.team.opponent();
        let target_ids: Vec<String> = if skill.aoe_radius > 0 {
            let area = aoe_area(anchor, skill.aoe_radius);
            self.living_on_team(opponents)
                .iter()
                .filter(|c| area.contains(&c.position))
                .map(|c| c.id.clone())
                .collect()
        } else {
            let target_id = target.ok_or(BattleError::MissingTarget)?;
            let enemy = self.combatant(target_id)?;
            if enemy.team != opponents {
                return Err(BattleError::MissingTarget);
            }
            vec![enemy.id.clone()]
        };

        if target_ids.is_empty() {
            return Err(BattleError::MissingTarget);
        }
        Ok(target_ids)
    }

    fn execute_item(&mut self, actor_id: &str, item_id: &str) -> Result<()> {
        let actor = self.combatant(actor_id)?;
        if actor.action_points < 1 {
            return Err(BattleError::InsufficientActionPoints {
                required: 1,
                available: actor.action_points,
            });
        }

        let round = self.round;
        let actor = self.combatant_mut(actor_id)?;
        let name = actor.name.clone();
        actor.action_points -= 1;

        let mut entry = BattleLogEntry::new(
            round,
            actor_id,
            name.clone(),
            LogKind::Item,
            format!("{name} usa o item {item_id}."),
        );
        if item_id == HEALING_POTION_ID {
            let actor = self.combatant_mut(actor_id)?;
            let healed = (actor.hp + POTION_HEAL).min(actor.max_hp) - actor.hp;
            actor.hp += healed;
            entry.healing = Some(healed);
            entry.summary = format!("{name} bebe uma poção e recupera {healed} de vida.");
        }
        self.push_log(entry);
        self.touch();
        Ok(())
    }

    /// Flee always attempts: success ends the battle for the fleeing
    /// side, failure zeroes the remaining action points.
    fn execute_flee(&mut self, actor_id: &str, dice: &mut dyn DiceRoller) -> Result<()> {
        let actor = self.combatant(actor_id)?;
        let velocidade = actor.effective_attributes().velocidade;
        let chance = (percent(30) + percent(2) * Fixed::from_num(velocidade)).min(Fixed::ONE);
        let succeeded = dice.fraction() < chance;

        let round = self.round;
        let team = actor.team;
        let name = actor.name.clone();

        if succeeded {
            self.push_log(BattleLogEntry::new(
                round,
                actor_id,
                name.clone(),
                LogKind::Flee,
                format!("{name} foge da batalha!"),
            ));
            match team {
                Team::Player => {
                    self.phase = BattlePhase::Defeat;
                }
                Team::Enemy => {
                    self.phase = BattlePhase::Victory;
                    self.rewards = Some(self.compute_rewards(dice));
                }
            }
            tracing::debug!(combatant = %actor_id, "flee succeeded");
        } else {
            let actor = self.combatant_mut(actor_id)?;
            actor.action_points = 0;
            self.push_log(BattleLogEntry::new(
                round,
                actor_id,
                name.clone(),
                LogKind::Flee,
                format!("{name} tenta fugir e falha."),
            ));
        }
        self.touch();
        Ok(())
    }

    fn execute_end_turn(&mut self, actor_id: &str) -> Result<()> {
        let round = self.round;
        let actor = self.combatant_mut(actor_id)?;
        let name = actor.name.clone();
        actor.action_points = 0;

        self.push_log(BattleLogEntry::new(
            round,
            actor_id,
            name.clone(),
            LogKind::EndTurn,
            format!("{name} encerra o turno."),
        ));
        self.touch();
        Ok(())
    }
}
