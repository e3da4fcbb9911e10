//! Batch battle runner for balance testing.
//!
//! Runs many seeded battles in parallel using rayon to collect win-rate
//! and pacing metrics efficiently.

use std::path::PathBuf;
use std::time::Instant;

use battle_core::prelude::AiPattern;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::metrics::{BatchSummary, BattleReport};
use crate::runner::{run_battle, RunConfig};

/// Configuration for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of battles to run.
    pub battle_count: u32,
    /// Maximum parallel battles (0 = rayon default).
    pub parallel_battles: u32,
    /// Output directory for results.
    pub output_dir: PathBuf,
    /// Starting seed; battle `i` runs with `seed_start + i`.
    pub seed_start: u64,
    /// Round bound per battle.
    pub max_rounds: u32,
    /// Player combatants per battle.
    pub party_size: usize,
    /// Enemy combatants per battle.
    pub enemy_count: usize,
    /// Decision policy for every enemy.
    pub pattern: AiPattern,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            battle_count: 100,
            parallel_battles: 0,
            output_dir: PathBuf::from("results"),
            seed_start: 0,
            max_rounds: 40,
            party_size: 2,
            enemy_count: 2,
            pattern: AiPattern::Aggressive,
        }
    }
}

impl BatchConfig {
    /// Config for a given battle count.
    #[must_use]
    pub fn new(battle_count: u32) -> Self {
        Self {
            battle_count,
            ..Default::default()
        }
    }

    /// Set output directory.
    #[must_use]
    pub fn with_output(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    /// Set seed start.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
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

    fn run_config(&self, seed: u64) -> RunConfig {
        RunConfig {
            seed,
            max_rounds: self.max_rounds,
            party_size: self.party_size,
            enemy_count: self.enemy_count,
            pattern: self.pattern,
        }
    }
}

/// Results from a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used.
    pub config: BatchConfig,
    /// Individual battle reports.
    pub reports: Vec<BattleReport>,
    /// Aggregate summary.
    pub summary: BatchSummary,
    /// Total runtime.
    pub duration_seconds: f64,
    /// Errors encountered.
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from a JSON file.
    pub fn load(path: &std::path::Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Error during a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    /// Battle index.
    pub battle_index: u32,
    /// Seed used.
    pub seed: u64,
    /// Error message.
    pub message: String,
}

/// Run a batch of battles.
#[must_use]
pub fn run_batch(config: BatchConfig) -> BatchResults {
    let start = Instant::now();

    info!("Starting batch run: {} battles", config.battle_count);

    if config.parallel_battles > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_battles as usize)
            .build_global()
            .ok(); // Ignore if already set
    }

    let results: Vec<Result<BattleReport, BatchError>> = (0..config.battle_count)
        .into_par_iter()
        .map(|i| {
            let seed = config.seed_start.wrapping_add(u64::from(i));
            run_battle(&config.run_config(seed)).map_err(|e| {
                warn!("Battle {} failed: {}", i, e);
                BatchError {
                    battle_index: i,
                    seed,
                    message: e.to_string(),
                }
            })
        })
        .collect();

    let (reports, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let reports: Vec<BattleReport> = reports.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let summary = BatchSummary::from_reports(&reports);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        "Batch complete: {} battles in {:.1}s ({:.1} battles/sec)",
        reports.len(),
        duration_seconds,
        reports.len() as f64 / duration_seconds.max(0.001)
    );

    BatchResults {
        config,
        reports,
        summary,
        duration_seconds,
        errors,
    }
}

/// Verify determinism by running the same seed multiple times.
#[must_use]
pub fn verify_determinism(seed: u64, runs: u32) -> bool {
    let config = RunConfig::new(seed);
    let reports: Vec<BattleReport> = (0..runs)
        .filter_map(|_| run_battle(&config).ok())
        .collect();
    if reports.len() != runs as usize {
        return false;
    }

    let first = &reports[0];
    reports.iter().all(|r| {
        r.state_hash == first.state_hash && r.winner == first.winner && r.rounds == first.rounds
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_config_default() {
        let config = BatchConfig::default();
        assert_eq!(config.battle_count, 100);
        assert_eq!(config.seed_start, 0);
    }

    #[test]
    fn test_batch_config_builder() {
        let config = BatchConfig::new(500)
            .with_output(PathBuf::from("/tmp/results"))
            .with_seed(12345)
            .with_roster(3, 4);

        assert_eq!(config.battle_count, 500);
        assert_eq!(config.seed_start, 12345);
        assert_eq!(config.party_size, 3);
        assert_eq!(config.enemy_count, 4);
    }

    #[test]
    fn test_run_batch_small() {
        let results = run_batch(BatchConfig::new(10));
        assert_eq!(results.reports.len(), 10);
        assert!(results.errors.is_empty());
        assert!(results.duration_seconds > 0.0);
    }

    #[test]
    fn test_batch_summary_calculated() {
        let results = run_batch(BatchConfig::new(20));
        assert_eq!(results.summary.battles, 20);
        assert!(results.summary.player_win_rate >= 0.0);
    }

    #[test]
    fn test_verify_determinism() {
        assert!(verify_determinism(12345, 5));
    }

    #[test]
    fn test_batch_results_save_load() {
        let results = run_batch(BatchConfig::new(5));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");

        results.save(&path).unwrap();
        assert!(path.exists());

        let loaded = BatchResults::load(&path).unwrap();
        assert_eq!(loaded.reports.len(), 5);
        assert_eq!(loaded.config.battle_count, 5);
    }
}
