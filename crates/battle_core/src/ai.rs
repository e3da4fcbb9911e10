//! Enemy decision policies.
//!
//! Each policy is a deterministic function from a battle snapshot to an
//! ordered action list for one enemy's turn. The host executes the list
//! one action at a time so presentation can pace it. Planning never
//! mutates state; it tracks a local AP budget and position instead.

use serde::{Deserialize, Serialize};

use crate::action::BattleAction;
use crate::battle::BattleState;
use crate::combatant::{BattleCombatant, Team};
use crate::error::Result;
use crate::grid::{self, aoe_area, GridPosition};
use crate::skill::{BattleSkill, SkillCategory, SkillEffect};
use crate::status::ControlKind;

/// Decision policy configured on an enemy template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AiPattern {
    /// Hunt the weakest player.
    Aggressive,
    /// Preserve itself, attack opportunistically.
    Defensive,
    /// Neutralize the biggest threat, prefer AoE and debuffs.
    Tactical,
    /// Keep distance, flee when hurt.
    Coward,
}

/// Plan one enemy's turn as an ordered action list.
///
/// The plan always respects the available action points and contains at
/// most one attack-class action (attack or skill). It ends with an
/// explicit end-turn so the host knows when to advance.
pub fn enemy_turn_actions(state: &BattleState, enemy_id: &str) -> Result<Vec<BattleAction>> {
    let enemy = state.combatant(enemy_id)?;
    let pattern = enemy.ai_pattern.unwrap_or(AiPattern::Aggressive);

    if enemy.action_points == 0 {
        return Ok(vec![BattleAction::EndTurn { actor: enemy_id.into() }]);
    }

    let mut actions = match pattern {
        AiPattern::Aggressive => plan_aggressive(state, enemy, enemy.action_points, None),
        AiPattern::Defensive => plan_defensive(state, enemy),
        AiPattern::Tactical => plan_tactical(state, enemy),
        AiPattern::Coward => plan_coward(state, enemy),
    };
    actions.push(BattleAction::EndTurn { actor: enemy_id.into() });
    tracing::debug!(enemy = %enemy_id, ?pattern, steps = actions.len(), "enemy turn planned");
    Ok(actions)
}

/// Hunt the lowest-HP living opponent: damaging skill in range, else
/// basic attack if adjacent, else close the gap with remaining AP.
fn plan_aggressive(
    state: &BattleState,
    enemy: &BattleCombatant,
    ap_budget: u32,
    forced_target: Option<&BattleCombatant>,
) -> Vec<BattleAction> {
    let Some(target) = forced_target.or_else(|| lowest_hp_opponent(state, enemy.team)) else {
        return Vec::new();
    };

    let mut actions = Vec::new();
    let mut ap = ap_budget.min(enemy.action_points);
    let mut position = enemy.position;

    let distance = position.manhattan(target.position);
    if let Some(skill) = damaging_skill(enemy, ap, |s| s.range >= distance) {
        actions.push(BattleAction::Skill {
            actor: enemy.id.clone(),
            skill_id: skill.id.clone(),
            target: Some(target.id.clone()),
            target_position: None,
        });
        return actions;
    }

    if distance <= 1 && ap >= 1 {
        actions.push(BattleAction::Attack {
            actor: enemy.id.clone(),
            target: target.id.clone(),
        });
        return actions;
    }

    // Close in, keeping one AP for the swing when possible.
    if !enemy.has_control(ControlKind::Root) {
        let move_budget = if ap >= 2 { ap - 1 } else { ap };
        if let Some(to) = step_toward(state, enemy, position, target.position, move_budget) {
            let cost = position.manhattan(to).max(1);
            actions.push(BattleAction::Move {
                actor: enemy.id.clone(),
                to,
            });
            ap -= cost.min(ap);
            position = to;
        }
    }

    if ap >= 1 && position.manhattan(target.position) <= 1 {
        actions.push(BattleAction::Attack {
            actor: enemy.id.clone(),
            target: target.id.clone(),
        });
    }

    actions
}

/// Self-preserve below half HP (heal, else self-buff, else defend);
/// otherwise a throttled hunt capped at 2 AP.
fn plan_defensive(state: &BattleState, enemy: &BattleCombatant) -> Vec<BattleAction> {
    if enemy.hp * 2 < enemy.max_hp {
        if let Some(skill) = usable_skill(enemy, enemy.action_points, |s| {
            s.category == SkillCategory::Cura
        }) {
            return vec![BattleAction::Skill {
                actor: enemy.id.clone(),
                skill_id: skill.id.clone(),
                target: Some(enemy.id.clone()),
                target_position: None,
            }];
        }
        if let Some(skill) = usable_skill(enemy, enemy.action_points, |s| {
            s.category == SkillCategory::Buff
        }) {
            return vec![BattleAction::Skill {
                actor: enemy.id.clone(),
                skill_id: skill.id.clone(),
                target: Some(enemy.id.clone()),
                target_position: None,
            }];
        }
        if enemy.action_points >= 1 {
            return vec![BattleAction::Defend {
                actor: enemy.id.clone(),
            }];
        }
        return Vec::new();
    }

    plan_aggressive(state, enemy, 2, None)
}

/// Target the highest-ataque opponent. Prefer an AoE that catches two
/// or more opponents, else a debuff on an undebuffed target, else hunt
/// the threat directly.
fn plan_tactical(state: &BattleState, enemy: &BattleCombatant) -> Vec<BattleAction> {
    let Some(threat) = highest_ataque_opponent(state, enemy.team) else {
        return Vec::new();
    };

    if let Some(skill) = damaging_skill(enemy, enemy.action_points, |s| s.aoe_radius > 0) {
        if let Some(anchor) = best_aoe_anchor(state, enemy, skill) {
            return vec![BattleAction::Skill {
                actor: enemy.id.clone(),
                skill_id: skill.id.clone(),
                target: None,
                target_position: Some(anchor),
            }];
        }
    }

    if let Some(skill) = usable_skill(enemy, enemy.action_points, |s| {
        s.category == SkillCategory::Debuff
    }) {
        let debuff_id = skill.status_apply.as_ref().map(|r| r.effect.id.clone());
        let candidate = state
            .living_on_team(enemy.team.opponent())
            .into_iter()
            .find(|p| {
                enemy.position.manhattan(p.position) <= skill.range
                    && debuff_id
                        .as_ref()
                        .map_or(true, |id| !p.effects.iter().any(|e| &e.id == id))
            })
            .map(|p| p.id.clone());
        if let Some(target) = candidate {
            return vec![BattleAction::Skill {
                actor: enemy.id.clone(),
                skill_id: skill.id.clone(),
                target: Some(target),
                target_position: None,
            }];
        }
    }

    plan_aggressive(state, enemy, enemy.action_points, Some(threat))
}

/// Flee below 30% HP; otherwise keep distance and poke with ranged
/// skills, falling back to the hunt when no ranged option exists.
fn plan_coward(state: &BattleState, enemy: &BattleCombatant) -> Vec<BattleAction> {
    if enemy.hp * 10 < enemy.max_hp * 3 {
        return vec![BattleAction::Flee {
            actor: enemy.id.clone(),
        }];
    }

    let Some(nearest) = nearest_opponent(state, enemy.team, enemy.position) else {
        return Vec::new();
    };

    let has_ranged = enemy.skills.iter().any(|s| {
        s.range >= 2 && s.current_uses > 0 && matches!(s.effect, SkillEffect::Damage(_))
    });
    if !has_ranged {
        return plan_aggressive(state, enemy, enemy.action_points, None);
    }

    let mut actions = Vec::new();
    let mut ap = enemy.action_points;
    let mut position = enemy.position;

    // Back off one step before shooting when in melee reach.
    if position.manhattan(nearest.position) <= 1 && !enemy.has_control(ControlKind::Root) && ap >= 2 {
        if let Some(to) = step_away(state, enemy, position, nearest.position, 1) {
            let cost = position.manhattan(to).max(1);
            actions.push(BattleAction::Move {
                actor: enemy.id.clone(),
                to,
            });
            ap -= cost.min(ap);
            position = to;
        }
    }

    let distance = position.manhattan(nearest.position);
    if let Some(skill) = damaging_skill(enemy, ap, |s| s.range >= 2 && s.range >= distance) {
        actions.push(BattleAction::Skill {
            actor: enemy.id.clone(),
            skill_id: skill.id.clone(),
            target: Some(nearest.id.clone()),
            target_position: None,
        });
    }

    actions
}

fn lowest_hp_opponent(state: &BattleState, team: Team) -> Option<&BattleCombatant> {
    state
        .living_on_team(team.opponent())
        .into_iter()
        .min_by_key(|p| (p.hp, p.id.clone()))
}

fn highest_ataque_opponent(state: &BattleState, team: Team) -> Option<&BattleCombatant> {
    state
        .living_on_team(team.opponent())
        .into_iter()
        .max_by_key(|p| (p.effective_attributes().ataque, std::cmp::Reverse(p.id.clone())))
}

fn nearest_opponent(state: &BattleState, team: Team, from: GridPosition) -> Option<&BattleCombatant> {
    state
        .living_on_team(team.opponent())
        .into_iter()
        .min_by_key(|p| (from.manhattan(p.position), p.id.clone()))
}

fn usable_skill<'a>(
    enemy: &'a BattleCombatant,
    ap: u32,
    filter: impl Fn(&BattleSkill) -> bool,
) -> Option<&'a BattleSkill> {
    enemy
        .skills
        .iter()
        .find(|s| s.current_uses > 0 && s.ap_cost <= ap && filter(s))
}

fn damaging_skill<'a>(
    enemy: &'a BattleCombatant,
    ap: u32,
    filter: impl Fn(&BattleSkill) -> bool,
) -> Option<&'a BattleSkill> {
    usable_skill(enemy, ap, |s| {
        matches!(s.effect, SkillEffect::Damage(_)) && filter(s)
    })
}

/// Anchor tile maximizing opponents caught in the skill's blast,
/// requiring at least two. Candidate anchors are the opponents' tiles.
fn best_aoe_anchor(
    state: &BattleState,
    enemy: &BattleCombatant,
    skill: &BattleSkill,
) -> Option<GridPosition> {
    let opponents = state.living_on_team(enemy.team.opponent());
    let mut best: Option<(usize, GridPosition)> = None;
    for anchor in opponents.iter().map(|p| p.position) {
        if enemy.position.manhattan(anchor) > skill.range {
            continue;
        }
        let area = aoe_area(anchor, skill.aoe_radius);
        let hits = opponents.iter().filter(|p| area.contains(&p.position)).count();
        if hits >= 2 && best.map_or(true, |(b, _)| hits > b) {
            best = Some((hits, anchor));
        }
    }
    best.map(|(_, anchor)| anchor)
}

/// Reachable tile that best closes the gap to `target`, if any improves it.
fn step_toward(
    state: &BattleState,
    enemy: &BattleCombatant,
    from: GridPosition,
    target: GridPosition,
    max_steps: u32,
) -> Option<GridPosition> {
    reachable_tiles(state, enemy, from, max_steps)
        .into_iter()
        .filter(|t| from.manhattan(*t) <= max_steps)
        .min_by_key(|t| (t.manhattan(target), *t))
        .filter(|t| t.manhattan(target) < from.manhattan(target))
}

/// Reachable tile that best widens the gap to `threat`, if any widens it.
fn step_away(
    state: &BattleState,
    enemy: &BattleCombatant,
    from: GridPosition,
    threat: GridPosition,
    max_steps: u32,
) -> Option<GridPosition> {
    reachable_tiles(state, enemy, from, max_steps)
        .into_iter()
        .filter(|t| from.manhattan(*t) <= max_steps)
        .max_by_key(|t| (t.manhattan(threat), std::cmp::Reverse(*t)))
        .filter(|t| t.manhattan(threat) > from.manhattan(threat))
}

fn reachable_tiles(
    state: &BattleState,
    enemy: &BattleCombatant,
    from: GridPosition,
    max_steps: u32,
) -> Vec<GridPosition> {
    grid::movement_range(
        &state.terrain,
        &state.occupied_positions(&enemy.id),
        from,
        max_steps,
    )
}
