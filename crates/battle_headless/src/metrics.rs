//! Per-battle reports and batch aggregates.

use serde::{Deserialize, Serialize};

/// Which side won a battle, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winner {
    /// Players won.
    Players,
    /// Enemies won (or the party fled).
    Enemies,
    /// Round bound hit before a terminal phase.
    Unresolved,
}

/// Metrics collected from one autoplayed battle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleReport {
    /// Seed the battle ran from.
    pub seed: u64,
    /// Who won.
    pub winner: Winner,
    /// Rounds elapsed when the battle ended.
    pub rounds: u32,
    /// Log entries produced.
    pub log_entries: usize,
    /// Final state hash, for determinism checks.
    pub state_hash: u64,
    /// XP awarded on victory.
    pub xp: u32,
    /// Gold awarded on victory.
    pub gold: u32,
}

/// Aggregate summary over a batch of battles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Battles run.
    pub battles: usize,
    /// Player-side wins.
    pub player_wins: usize,
    /// Enemy-side wins.
    pub enemy_wins: usize,
    /// Battles that hit the round bound.
    pub unresolved: usize,
    /// Player win rate in `[0, 1]`.
    pub player_win_rate: f64,
    /// Mean rounds per resolved battle.
    pub avg_rounds: f64,
}

impl BatchSummary {
    /// Aggregate a list of reports.
    #[must_use]
    pub fn from_reports(reports: &[BattleReport]) -> Self {
        let battles = reports.len();
        let player_wins = reports.iter().filter(|r| r.winner == Winner::Players).count();
        let enemy_wins = reports.iter().filter(|r| r.winner == Winner::Enemies).count();
        let unresolved = battles - player_wins - enemy_wins;

        let resolved = (player_wins + enemy_wins).max(1);
        let total_rounds: u32 = reports
            .iter()
            .filter(|r| r.winner != Winner::Unresolved)
            .map(|r| r.rounds)
            .sum();

        Self {
            battles,
            player_wins,
            enemy_wins,
            unresolved,
            player_win_rate: player_wins as f64 / battles.max(1) as f64,
            avg_rounds: f64::from(total_rounds) / resolved as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(seed: u64, winner: Winner, rounds: u32) -> BattleReport {
        BattleReport {
            seed,
            winner,
            rounds,
            log_entries: 10,
            state_hash: 0,
            xp: 0,
            gold: 0,
        }
    }

    #[test]
    fn test_summary_aggregates() {
        let reports = vec![
            report(1, Winner::Players, 4),
            report(2, Winner::Players, 6),
            report(3, Winner::Enemies, 8),
            report(4, Winner::Unresolved, 40),
        ];
        let summary = BatchSummary::from_reports(&reports);
        assert_eq!(summary.battles, 4);
        assert_eq!(summary.player_wins, 2);
        assert_eq!(summary.enemy_wins, 1);
        assert_eq!(summary.unresolved, 1);
        assert!((summary.player_win_rate - 0.5).abs() < f64::EPSILON);
        assert!((summary.avg_rounds - 6.0).abs() < f64::EPSILON);
    }
}
