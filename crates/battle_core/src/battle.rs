//! Aggregate battle state: creation, turn management, victory, rewards.
//!
//! `BattleState` is the single snapshot threaded through every operation.
//! The phase field is the sole authority for whose turn it is and whether
//! the battle has ended; terminal phases reject all further mutation.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::combatant::{BattleCombatant, Team};
use crate::error::{BattleError, Result};
use crate::grid::{self, GridPosition, TerrainGrid, GRID_SIZE};
use crate::math::{round_at_least, Fixed};
use crate::records::{Character, Enemy};
use crate::rng::DiceRoller;
use crate::status;

/// Combatants allowed per side.
pub const MAX_TEAM_SIZE: usize = 4;

/// Item id dropped by lucky victories.
pub const HEALING_POTION_ID: &str = "pocao-de-cura";

/// Spawn tiles for player combatants, central sub-grid.
const PLAYER_SPAWNS: [GridPosition; MAX_TEAM_SIZE] = [
    GridPosition::new(4, 4),
    GridPosition::new(5, 4),
    GridPosition::new(4, 5),
    GridPosition::new(5, 5),
];

/// Spawn tiles for enemy combatants, board perimeter corners.
const ENEMY_SPAWNS: [GridPosition; MAX_TEAM_SIZE] = [
    GridPosition::new(0, 0),
    GridPosition::new(GRID_SIZE - 1, 0),
    GridPosition::new(0, GRID_SIZE - 1),
    GridPosition::new(GRID_SIZE - 1, GRID_SIZE - 1),
];

/// Lifecycle phase of a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattlePhase {
    /// Created but not yet begun; no actions accepted.
    Intro,
    /// A player combatant is acting.
    PlayerTurn,
    /// An enemy combatant is acting.
    EnemyTurn,
    /// All enemies defeated. Terminal.
    Victory,
    /// All players defeated or fled. Terminal.
    Defeat,
}

impl BattlePhase {
    /// Whether the battle has ended.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Victory | Self::Defeat)
    }
}

/// Kind of event a log entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogKind {
    /// A reposition.
    Move,
    /// A basic attack.
    Attack,
    /// A defend stance.
    Defend,
    /// A skill resolution.
    Skill,
    /// An item use.
    Item,
    /// A flee attempt.
    Flee,
    /// An explicit turn end.
    EndTurn,
    /// A status effect tick or application.
    Status,
    /// A turn lost to stun.
    TurnSkipped,
    /// Battle end bookkeeping.
    BattleEnd,
}

/// An immutable record of one resolved effect.
///
/// Append-only, except that dice-roll resolution may retroactively amend
/// the most recent entry's damage, healing, and crit flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleLogEntry {
    /// Round the event happened in.
    pub round: u32,
    /// Acting combatant id.
    pub actor_id: String,
    /// Acting combatant name.
    pub actor_name: String,
    /// What kind of event this is.
    pub kind: LogKind,
    /// Target combatant id, when one exists.
    pub target_id: Option<String>,
    /// Target combatant name.
    pub target_name: Option<String>,
    /// Damage dealt.
    pub damage: Option<u32>,
    /// Healing applied.
    pub healing: Option<u32>,
    /// Id of a status effect applied by this event.
    pub status_applied: Option<String>,
    /// Whether the target was killed.
    pub is_kill: bool,
    /// Whether a dice roll upgraded this event to a critical.
    pub is_crit: bool,
    /// Human-readable summary.
    pub summary: String,
}

impl BattleLogEntry {
    /// Build a minimal entry; optional fields start empty.
    #[must_use]
    pub fn new(
        round: u32,
        actor_id: impl Into<String>,
        actor_name: impl Into<String>,
        kind: LogKind,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            round,
            actor_id: actor_id.into(),
            actor_name: actor_name.into(),
            kind,
            target_id: None,
            target_name: None,
            damage: None,
            healing: None,
            status_applied: None,
            is_kill: false,
            is_crit: false,
            summary: summary.into(),
        }
    }

    /// Builder method to set the target.
    #[must_use]
    pub fn with_target(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.target_id = Some(id.into());
        self.target_name = Some(name.into());
        self
    }

    /// Builder method to set damage dealt.
    #[must_use]
    pub fn with_damage(mut self, damage: u32) -> Self {
        self.damage = Some(damage);
        self
    }

    /// Builder method to set healing applied.
    #[must_use]
    pub fn with_healing(mut self, healing: u32) -> Self {
        self.healing = Some(healing);
        self
    }
}

/// Rewards computed once on victory.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BattleRewards {
    /// Experience points earned.
    pub xp: u32,
    /// Gold earned.
    pub gold: u32,
    /// Item ids dropped.
    pub items: Vec<String>,
}

/// The aggregate battle snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleState {
    /// Battle identifier.
    pub id: String,
    /// World the battle belongs to.
    pub world_id: String,
    /// Location within the world.
    pub location_id: String,
    /// All combatants, players and enemies.
    pub combatants: Vec<BattleCombatant>,
    /// Acting order for the current round, by combatant id.
    pub turn_order: Vec<String>,
    /// Index into `turn_order` of the acting combatant.
    pub current_turn_index: usize,
    /// Round counter, starting at 1.
    pub round: u32,
    /// Lifecycle phase.
    pub phase: BattlePhase,
    /// The battle board.
    pub terrain: TerrainGrid,
    /// Append-only action log.
    pub log: Vec<BattleLogEntry>,
    /// Rewards, populated once on victory.
    pub rewards: Option<BattleRewards>,
    /// Logical revision counter, bumped on every mutation.
    pub updated_at: u64,
}

/// Sort living combatants into acting order.
///
/// Effective speed descending; ties broken by player team before enemy
/// team, then by name ascending.
#[must_use]
pub fn calculate_turn_order(combatants: &[BattleCombatant]) -> Vec<String> {
    let mut living: Vec<&BattleCombatant> = combatants.iter().filter(|c| c.is_alive()).collect();
    living.sort_by(|a, b| {
        b.effective_speed()
            .cmp(&a.effective_speed())
            .then_with(|| team_rank(a.team).cmp(&team_rank(b.team)))
            .then_with(|| a.name.cmp(&b.name))
    });
    living.into_iter().map(|c| c.id.clone()).collect()
}

const fn team_rank(team: Team) -> u8 {
    match team {
        Team::Player => 0,
        Team::Enemy => 1,
    }
}

/// Create a battle from external character and enemy records.
///
/// Each side is capped at [`MAX_TEAM_SIZE`]; players spawn on the central
/// sub-grid, enemies on the perimeter corners. Terrain starts all-normal;
/// hosts may decorate it with [`TerrainGrid::set_tile`] before beginning.
#[must_use]
pub fn create_battle(
    world_id: impl Into<String>,
    location_id: impl Into<String>,
    characters: &[Character],
    enemies: &[Enemy],
) -> BattleState {
    let world_id = world_id.into();
    let location_id = location_id.into();

    let mut combatants: Vec<BattleCombatant> = Vec::new();
    for (character, &spawn) in characters.iter().take(MAX_TEAM_SIZE).zip(PLAYER_SPAWNS.iter()) {
        combatants.push(character.to_combatant(spawn));
    }
    for (index, (enemy, &spawn)) in enemies
        .iter()
        .take(MAX_TEAM_SIZE)
        .zip(ENEMY_SPAWNS.iter())
        .enumerate()
    {
        combatants.push(enemy.to_combatant(format!("{}-{}", enemy.id, index + 1), spawn));
    }

    let turn_order = calculate_turn_order(&combatants);
    tracing::debug!(
        world = %world_id,
        location = %location_id,
        combatants = combatants.len(),
        "battle created"
    );

    BattleState {
        id: format!("battle-{world_id}-{location_id}"),
        world_id,
        location_id,
        combatants,
        turn_order,
        current_turn_index: 0,
        round: 1,
        phase: BattlePhase::Intro,
        terrain: TerrainGrid::new(),
        log: Vec::new(),
        rewards: None,
        updated_at: 0,
    }
}

impl BattleState {
    /// Bump the revision counter. Called after every mutation.
    pub fn touch(&mut self) {
        self.updated_at += 1;
    }

    /// Find a combatant by id.
    pub fn combatant(&self, id: &str) -> Result<&BattleCombatant> {
        self.combatants
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| BattleError::CombatantNotFound(id.to_string()))
    }

    /// Find a combatant by id, mutably.
    pub fn combatant_mut(&mut self, id: &str) -> Result<&mut BattleCombatant> {
        self.combatants
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| BattleError::CombatantNotFound(id.to_string()))
    }

    /// Id of the combatant whose turn it is.
    #[must_use]
    pub fn current_combatant_id(&self) -> Option<&str> {
        self.turn_order.get(self.current_turn_index).map(String::as_str)
    }

    /// Positions of living combatants other than `exclude_id`.
    #[must_use]
    pub fn occupied_positions(&self, exclude_id: &str) -> Vec<GridPosition> {
        self.combatants
            .iter()
            .filter(|c| c.is_alive() && c.id != exclude_id)
            .map(|c| c.position)
            .collect()
    }

    /// Living combatants on a team.
    #[must_use]
    pub fn living_on_team(&self, team: Team) -> Vec<&BattleCombatant> {
        self.combatants
            .iter()
            .filter(|c| c.team == team && c.is_alive())
            .collect()
    }

    /// Append a log entry.
    pub fn push_log(&mut self, entry: BattleLogEntry) {
        self.log.push(entry);
    }

    /// Tiles a combatant can move to with its remaining action points.
    pub fn movement_range(&self, combatant_id: &str) -> Result<Vec<GridPosition>> {
        let combatant = self.combatant(combatant_id)?;
        Ok(grid::movement_range(
            &self.terrain,
            &self.occupied_positions(combatant_id),
            combatant.position,
            combatant.action_points,
        ))
    }

    /// Tiles a combatant can hit with an action of the given range.
    pub fn attack_range(&self, combatant_id: &str, range: u32) -> Result<Vec<GridPosition>> {
        let combatant = self.combatant(combatant_id)?;
        Ok(grid::attack_range(combatant.position, range))
    }

    /// Leave the intro phase, handing the turn to the first combatant.
    pub fn begin(&mut self) -> Result<()> {
        if self.phase != BattlePhase::Intro {
            return Err(BattleError::BattleOver);
        }
        let first = self
            .current_combatant_id()
            .ok_or(BattleError::BattleOver)?
            .to_string();
        let team = self.combatant(&first)?.team;
        self.phase = phase_for_team(team);
        tracing::debug!(first = %first, "battle begun");
        self.touch();
        Ok(())
    }

    /// Hand the turn to the next living combatant.
    ///
    /// Wraps to a new round (recomputing turn order from current effective
    /// speeds) past the last index. Skips dead combatants. Runs the new
    /// current combatant's start-of-turn status ticks before granting
    /// action points; a stunned combatant gets zero and a skip entry.
    /// The skip loop is bounded: one full cycle with nobody able to act
    /// closes the battle as a defeat instead of spinning.
    pub fn advance_turn(&mut self, dice: &mut dyn DiceRoller) -> Result<()> {
        if self.phase.is_terminal() {
            return Err(BattleError::BattleOver);
        }

        let bound = 2 * self.turn_order.len().max(1) + 2;
        for _ in 0..bound {
            self.current_turn_index += 1;
            if self.current_turn_index >= self.turn_order.len() {
                self.current_turn_index = 0;
                self.round += 1;
                self.turn_order = calculate_turn_order(&self.combatants);
                tracing::debug!(round = self.round, "round rollover");
                if self.turn_order.is_empty() {
                    break;
                }
            }

            let Some(id) = self.current_combatant_id().map(str::to_string) else {
                break;
            };
            if !self.combatant(&id)?.is_alive() {
                continue;
            }

            self.run_turn_start(&id)?;
            self.check_battle_end(dice)?;
            if self.phase.is_terminal() {
                self.touch();
                return Ok(());
            }
            if !self.combatant(&id)?.is_alive() {
                continue;
            }

            let team = self.combatant(&id)?.team;
            self.phase = phase_for_team(team);
            self.touch();
            return Ok(());
        }

        // Nobody can act: close the battle rather than loop forever.
        self.phase = BattlePhase::Defeat;
        self.push_log(BattleLogEntry::new(
            self.round,
            "",
            "",
            LogKind::BattleEnd,
            "Nenhum combatente pode agir; a batalha termina.",
        ));
        self.touch();
        Ok(())
    }

    /// Start-of-turn processing for the combatant taking the turn.
    fn run_turn_start(&mut self, id: &str) -> Result<()> {
        let round = self.round;
        let combatant = self.combatant_mut(id)?;
        let name = combatant.name.clone();

        combatant.is_defending = false;
        combatant.has_attacked = false;
        combatant.has_defended = false;

        // Read stun before ticking so a stun on its last turn still skips.
        let stunned = combatant.has_control(crate::status::ControlKind::Stun);

        let max_hp = combatant.max_hp;
        let mut hp = combatant.hp;
        let ticks = status::tick_turn_start(&mut combatant.effects, &mut hp, max_hp);
        combatant.hp = hp;

        combatant.action_points = if stunned { 0 } else { combatant.max_action_points };

        for tick in ticks {
            let summary = if tick.damage > 0 {
                format!("{name} sofre {} de dano de {}.", tick.damage, tick.effect_name)
            } else {
                format!("{name} recupera {} de vida de {}.", tick.healing, tick.effect_name)
            };
            let mut entry = BattleLogEntry::new(round, id, name.clone(), LogKind::Status, summary);
            entry.damage = (tick.damage > 0).then_some(tick.damage);
            entry.healing = (tick.healing > 0).then_some(tick.healing);
            entry.status_applied = Some(tick.effect_id);
            self.push_log(entry);
        }

        if stunned {
            tracing::debug!(combatant = %id, "turn skipped by stun");
            self.push_log(BattleLogEntry::new(
                round,
                id,
                name.clone(),
                LogKind::TurnSkipped,
                format!("{name} está atordoado e perde o turno."),
            ));
        }

        Ok(())
    }

    /// Re-check terminal conditions after an HP-affecting resolution.
    ///
    /// Sets `phase` to victory or defeat when one side has no living
    /// combatants left; victory computes rewards exactly once.
    pub fn check_battle_end(&mut self, dice: &mut dyn DiceRoller) -> Result<()> {
        if self.phase.is_terminal() {
            return Ok(());
        }
        if self.living_on_team(Team::Enemy).is_empty() {
            self.phase = BattlePhase::Victory;
            let rewards = self.compute_rewards(dice);
            tracing::debug!(xp = rewards.xp, gold = rewards.gold, "victory");
            self.rewards = Some(rewards);
            self.push_log(BattleLogEntry::new(
                self.round,
                "",
                "",
                LogKind::BattleEnd,
                "Vitória! Todos os inimigos foram derrotados.",
            ));
        } else if self.living_on_team(Team::Player).is_empty() {
            self.phase = BattlePhase::Defeat;
            tracing::debug!("defeat");
            self.push_log(BattleLogEntry::new(
                self.round,
                "",
                "",
                LogKind::BattleEnd,
                "Derrota. Todos os heróis caíram.",
            ));
        }
        Ok(())
    }

    /// Compute victory rewards from defeated enemies and the round count.
    pub(crate) fn compute_rewards(&self, dice: &mut dyn DiceRoller) -> BattleRewards {
        let mut xp: i64 = 0;
        let mut gold: i64 = 0;

        for enemy in self
            .combatants
            .iter()
            .filter(|c| c.team == Team::Enemy && !c.is_alive())
        {
            let max_hp = Fixed::from_num(enemy.max_hp);
            xp += 10 * round_at_least(max_hp / Fixed::from_num(10), 1);
            // The HP factor stays fractional; only the final product rounds.
            let hp_factor = (max_hp / Fixed::from_num(20)).max(Fixed::ONE);
            let variance = dice.fraction() * Fixed::from_num(10) * hp_factor;
            gold += 5 + round_at_least(variance, 0);
        }

        // Speed bonus for finishing early.
        if self.round <= 3 {
            xp = round_at_least(Fixed::from_num(xp) * crate::math::percent(120), 0);
        } else if self.round <= 5 {
            xp = round_at_least(Fixed::from_num(xp) * crate::math::percent(110), 0);
        }

        let mut items = Vec::new();
        if dice.fraction() < crate::math::percent(20) {
            items.push(HEALING_POTION_ID.to_string());
        }

        BattleRewards {
            xp: xp.max(0) as u32,
            gold: gold.max(0) as u32,
            items,
        }
    }

    /// Serialize the state to bytes for persistence or replay.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| BattleError::Serialization(e.to_string()))
    }

    /// Restore a state previously produced by [`Self::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| BattleError::Serialization(e.to_string()))
    }

    /// Hash of the full state, for determinism checks.
    pub fn state_hash(&self) -> Result<u64> {
        let bytes = self.to_bytes()?;
        let mut hasher = DefaultHasher::new();
        bytes.hash(&mut hasher);
        Ok(hasher.finish())
    }
}

const fn phase_for_team(team: Team) -> BattlePhase {
    match team {
        Team::Player => BattlePhase::PlayerTurn,
        Team::Enemy => BattlePhase::EnemyTurn,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::BattleAttributes;
    use crate::rng::SeededDice;
    use crate::status::{ControlKind, StatusEffect, StatusKind};

    fn character(id: &str, name: &str, velocidade: i32) -> Character {
        Character {
            id: id.into(),
            name: name.into(),
            archetype: "guerreiro".into(),
            level: 1,
            portrait_url: None,
            hp: 30,
            max_hp: 30,
            attributes: BattleAttributes::new(10, 8, 6, velocidade, 7),
            equipment: Vec::new(),
            skills: Vec::new(),
        }
    }

    fn enemy(id: &str, name: &str, velocidade: i32) -> Enemy {
        Enemy {
            id: id.into(),
            name: name.into(),
            level: 1,
            portrait_url: None,
            hp: 15,
            max_hp: 15,
            attributes: BattleAttributes::new(6, 3, 1, velocidade, 5),
            skills: Vec::new(),
            ai_pattern: crate::ai::AiPattern::Aggressive,
        }
    }

    fn setup() -> BattleState {
        create_battle(
            "w1",
            "l1",
            &[character("heroi", "Herói", 12)],
            &[enemy("goblin", "Goblin", 8)],
        )
    }

    #[test]
    fn test_create_battle_places_and_orders() {
        let state = setup();
        assert_eq!(state.combatants.len(), 2);
        assert_eq!(state.combatants[0].position, GridPosition::new(4, 4));
        assert_eq!(state.combatants[1].position, GridPosition::new(0, 0));
        assert_eq!(state.phase, BattlePhase::Intro);
        // Faster hero acts first
        assert_eq!(state.turn_order, vec!["heroi".to_string(), "goblin-1".to_string()]);
    }

    #[test]
    fn test_team_cap() {
        let characters: Vec<Character> = (0..6)
            .map(|i| character(&format!("c{i}"), &format!("C{i}"), 10))
            .collect();
        let state = create_battle("w", "l", &characters, &[enemy("g", "G", 5)]);
        assert_eq!(state.living_on_team(Team::Player).len(), MAX_TEAM_SIZE);
    }

    #[test]
    fn test_turn_order_tiebreaks() {
        let mut combatants = vec![
            character("b-heroi", "Bruno", 10).to_combatant(GridPosition::new(4, 4)),
            character("a-heroi", "Ana", 10).to_combatant(GridPosition::new(5, 4)),
            enemy("g", "Aaa", 10).to_combatant("g-1", GridPosition::new(0, 0)),
        ];
        combatants[2].attributes.velocidade = 10;

        let order = calculate_turn_order(&combatants);
        // Equal speed: players before enemies, then name ascending
        assert_eq!(order, vec!["a-heroi".to_string(), "b-heroi".to_string(), "g-1".to_string()]);
    }

    #[test]
    fn test_begin_sets_phase_from_first_combatant() {
        let mut state = setup();
        state.begin().unwrap();
        assert_eq!(state.phase, BattlePhase::PlayerTurn);
    }

    #[test]
    fn test_advance_turn_hands_to_enemy() {
        let mut state = setup();
        let mut dice = SeededDice::from_seed(1);
        state.begin().unwrap();
        state.advance_turn(&mut dice).unwrap();
        assert_eq!(state.current_combatant_id(), Some("goblin-1"));
        assert_eq!(state.phase, BattlePhase::EnemyTurn);
    }

    #[test]
    fn test_round_rollover_recomputes_order() {
        let mut state = setup();
        let mut dice = SeededDice::from_seed(1);
        state.begin().unwrap();
        state.advance_turn(&mut dice).unwrap();

        // Slow the hero below the goblin before the round rolls over
        state.combatant_mut("heroi").unwrap().attributes.velocidade = 1;
        state.advance_turn(&mut dice).unwrap();

        assert_eq!(state.round, 2);
        assert_eq!(state.turn_order, vec!["goblin-1".to_string(), "heroi".to_string()]);
    }

    #[test]
    fn test_stun_skip_zeroes_ap_and_logs() {
        let mut state = setup();
        let mut dice = SeededDice::from_seed(1);
        state.begin().unwrap();

        state.combatant_mut("goblin-1").unwrap().effects.push(StatusEffect::new(
            crate::status::STUN_EFFECT_ID,
            "Atordoado",
            StatusKind::Control(ControlKind::Stun),
            1,
        ));
        state.advance_turn(&mut dice).unwrap();

        assert_eq!(state.combatant("goblin-1").unwrap().action_points, 0);
        assert!(state.log.iter().any(|e| e.kind == LogKind::TurnSkipped));
        // has_control reads effects before end-of-tick removal
        assert!(!state.combatant("goblin-1").unwrap().has_control(ControlKind::Stun));
    }

    #[test]
    fn test_dot_tick_runs_before_ap_grant() {
        let mut state = setup();
        let mut dice = SeededDice::from_seed(1);
        state.begin().unwrap();

        state.combatant_mut("goblin-1").unwrap().effects.push(StatusEffect::new(
            "veneno",
            "Veneno",
            StatusKind::DamageOverTime { damage_per_turn: 4 },
            2,
        ));
        state.advance_turn(&mut dice).unwrap();

        assert_eq!(state.combatant("goblin-1").unwrap().hp, 11);
        assert!(state.log.iter().any(|e| e.kind == LogKind::Status && e.damage == Some(4)));
    }

    #[test]
    fn test_dot_death_skips_to_next_and_checks_end() {
        let mut state = setup();
        let mut dice = SeededDice::from_seed(1);
        state.begin().unwrap();

        let goblin = state.combatant_mut("goblin-1").unwrap();
        goblin.hp = 3;
        goblin.effects.push(StatusEffect::new(
            "veneno",
            "Veneno",
            StatusKind::DamageOverTime { damage_per_turn: 5 },
            2,
        ));
        state.advance_turn(&mut dice).unwrap();

        assert_eq!(state.phase, BattlePhase::Victory);
        assert!(state.rewards.is_some());
    }

    #[test]
    fn test_skip_loop_terminates_when_nobody_can_act() {
        let mut state = setup();
        let mut dice = SeededDice::from_seed(1);
        state.begin().unwrap();

        for combatant in &mut state.combatants {
            combatant.hp = 0;
        }
        state.advance_turn(&mut dice).unwrap();
        assert!(state.phase.is_terminal());
    }

    #[test]
    fn test_terminal_state_rejects_advance() {
        let mut state = setup();
        let mut dice = SeededDice::from_seed(1);
        state.phase = BattlePhase::Victory;
        assert!(matches!(
            state.advance_turn(&mut dice),
            Err(BattleError::BattleOver)
        ));
    }

    #[test]
    fn test_rewards_scale_with_enemies_and_speed() {
        let mut state = create_battle(
            "w",
            "l",
            &[character("heroi", "Herói", 12)],
            &[enemy("g1", "G1", 5), enemy("g2", "G2", 5)],
        );
        let mut dice = SeededDice::from_seed(3);
        state.begin().unwrap();
        for combatant in &mut state.combatants {
            if combatant.team == Team::Enemy {
                combatant.hp = 0;
            }
        }
        state.check_battle_end(&mut dice).unwrap();

        let rewards = state.rewards.as_ref().unwrap();
        // Two enemies at 15 max HP: 2 * 10 * round(1.5) = 40, +20% by round 3
        assert_eq!(rewards.xp, 48);
        assert!(rewards.gold >= 10);
    }

    #[test]
    fn test_gold_variance_scales_unrounded_hp_factor() {
        struct HalfFraction;
        impl DiceRoller for HalfFraction {
            fn d6(&mut self) -> i32 {
                3
            }
            fn d20(&mut self) -> i32 {
                10
            }
            fn fraction(&mut self) -> Fixed {
                crate::math::percent(50)
            }
        }

        let mut state = setup();
        let mut dice = HalfFraction;
        state.begin().unwrap();
        let goblin = state.combatant_mut("goblin-1").unwrap();
        goblin.max_hp = 30;
        goblin.hp = 0;
        state.check_battle_end(&mut dice).unwrap();

        let rewards = state.rewards.as_ref().unwrap();
        // 30 max HP, fraction 0.5: gold = 5 + round(0.5 * 10 * 1.5) = 13
        assert_eq!(rewards.gold, 13);
        // 30 max HP: xp = 10 * 3, +20% for finishing by round 3
        assert_eq!(rewards.xp, 36);
    }

    #[test]
    fn test_serialization_round_trip_and_hash() {
        let state = setup();
        let bytes = state.to_bytes().unwrap();
        let restored = BattleState::from_bytes(&bytes).unwrap();
        assert_eq!(state, restored);
        assert_eq!(state.state_hash().unwrap(), restored.state_hash().unwrap());
    }
}
