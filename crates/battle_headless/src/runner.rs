//! Single-battle runner.
//!
//! Builds a seeded roster, autoplays both sides with the decision
//! policies in `battle_core::ai`, and reports the outcome.

use battle_core::ai::enemy_turn_actions;
use battle_core::battle::{create_battle, BattlePhase, BattleState};
use battle_core::error::Result;
use battle_core::math::percent;
use battle_core::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::metrics::{BattleReport, Winner};

/// Configuration for a single headless battle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Seed for the dice source and roster variation.
    pub seed: u64,
    /// Round bound before the battle is reported unresolved.
    pub max_rounds: u32,
    /// Player combatants (1 to 4).
    pub party_size: usize,
    /// Enemy combatants (1 to 4).
    pub enemy_count: usize,
    /// Decision policy for every enemy.
    pub pattern: AiPattern,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            max_rounds: 40,
            party_size: 2,
            enemy_count: 2,
            pattern: AiPattern::Aggressive,
        }
    }
}

impl RunConfig {
    /// Config for a given seed with default roster sizes.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    /// Set roster sizes.
    #[must_use]
    pub fn with_roster(mut self, party_size: usize, enemy_count: usize) -> Self {
        self.party_size = party_size;
        self.enemy_count = enemy_count;
        self
    }

    /// Set the enemy decision policy.
    #[must_use]
    pub fn with_pattern(mut self, pattern: AiPattern) -> Self {
        self.pattern = pattern;
        self
    }
}

/// The standard single-target damaging skill for headless parties.
fn arcane_strike() -> BattleSkill {
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

fn light_heal() -> BattleSkill {
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

/// Build the battle for a config. Attribute spreads vary slightly by
/// index so teammates do not mirror each other.
fn build_battle(config: &RunConfig) -> BattleState {
    let party_size = config.party_size.clamp(1, 4);
    let enemy_count = config.enemy_count.clamp(1, 4);

    let characters: Vec<Character> = (0..party_size)
        .map(|i| {
            let i32i = i as i32;
            Character {
                id: format!("heroi-{i}"),
                name: format!("Heroi {i}"),
                archetype: "aventureiro".into(),
                level: 1,
                portrait_url: None,
                hp: 30,
                max_hp: 30,
                attributes: BattleAttributes::new(10 + i32i, 8, 8, 12 - i32i, 7),
                equipment: Vec::new(),
                skills: vec![arcane_strike(), light_heal()],
            }
        })
        .collect();

    let enemies: Vec<Enemy> = (0..enemy_count)
        .map(|i| {
            let i32i = i as i32;
            Enemy {
                id: format!("inimigo-{i}"),
                name: format!("Inimigo {i}"),
                level: 1,
                portrait_url: None,
                hp: 18,
                max_hp: 18,
                attributes: BattleAttributes::new(7 + i32i, 4, 2, 9, 5),
                skills: Vec::new(),
                ai_pattern: config.pattern,
            }
        })
        .collect();

    create_battle("simulacao", "arena", &characters, &enemies)
}

/// Run one battle to completion or the round bound.
///
/// Every turn, both sides included, is planned by the decision policies
/// and executed step by step. A plan step rejected mid-sequence is
/// skipped; rejections never mutate state.
pub fn run_battle(config: &RunConfig) -> Result<BattleReport> {
    let mut state = build_battle(config);
    let mut dice = SeededDice::from_seed(config.seed);
    state.begin()?;

    debug!(
        seed = config.seed,
        party = config.party_size,
        enemies = config.enemy_count,
        "battle started"
    );

    while !state.phase.is_terminal() && state.round <= config.max_rounds {
        let Some(id) = state.current_combatant_id().map(str::to_string) else {
            break;
        };
        let actions = enemy_turn_actions(&state, &id)?;
        for action in &actions {
            if state.phase.is_terminal() {
                break;
            }
            let _ = state.execute(action, &mut dice);
        }
        if state.phase.is_terminal() {
            break;
        }
        state.advance_turn(&mut dice)?;
    }

    let winner = match state.phase {
        BattlePhase::Victory => Winner::Players,
        BattlePhase::Defeat => Winner::Enemies,
        _ => Winner::Unresolved,
    };
    let (xp, gold) = state
        .rewards
        .as_ref()
        .map_or((0, 0), |r| (r.xp, r.gold));

    debug!(seed = config.seed, ?winner, rounds = state.round, "battle finished");

    Ok(BattleReport {
        seed: config.seed,
        winner,
        rounds: state.round,
        log_entries: state.log.len(),
        state_hash: state.state_hash()?,
        xp,
        gold,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_battle_resolves() {
        let report = run_battle(&RunConfig::new(7)).unwrap();
        assert_ne!(report.winner, Winner::Unresolved);
        assert!(report.rounds >= 1);
        assert!(report.log_entries > 0);
    }

    #[test]
    fn test_same_seed_same_hash() {
        let config = RunConfig::new(42);
        let a = run_battle(&config).unwrap();
        let b = run_battle(&config).unwrap();
        assert_eq!(a.state_hash, b.state_hash);
        assert_eq!(a.rounds, b.rounds);
        assert_eq!(a.winner, b.winner);
    }

    #[test]
    fn test_victory_carries_rewards() {
        // Lone enemy against a full party loses quickly.
        let config = RunConfig::new(3).with_roster(4, 1);
        let report = run_battle(&config).unwrap();
        if report.winner == Winner::Players {
            assert!(report.xp > 0);
            assert!(report.gold > 0);
        }
    }

    #[test]
    fn test_coward_pattern_runs() {
        let config = RunConfig::new(9).with_pattern(AiPattern::Coward);
        let report = run_battle(&config).unwrap();
        assert!(report.rounds >= 1);
    }
}
