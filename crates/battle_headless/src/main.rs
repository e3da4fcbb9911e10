//! Headless battle runner.
//!
//! Runs AI-vs-AI battles without any presentation layer. Designed for
//! balance testing, CI verification, and tuning.
//!
//! # Usage
//!
//! ```bash
//! # Run a single seeded battle
//! cargo run -p battle_headless -- run --seed 7
//!
//! # Run a batch for balance metrics
//! cargo run -p battle_headless -- batch --count 1000 --output results/
//!
//! # Verify determinism for a seed
//! cargo run -p battle_headless -- verify --seed 12345 --runs 5
//! ```
//!
//! Results go to stdout as JSON; logs go to stderr.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use battle_core::prelude::AiPattern;
use battle_headless::{run_batch, run_battle, BatchConfig, RunConfig};

#[derive(Parser)]
#[command(name = "battle_headless")]
#[command(about = "Headless battle runner for balance testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single seeded battle
    Run {
        /// Seed for dice and roster
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Player combatants (1-4)
        #[arg(long, default_value = "2")]
        party: usize,

        /// Enemy combatants (1-4)
        #[arg(long, default_value = "2")]
        enemies: usize,

        /// Enemy decision policy
        #[arg(long, default_value = "aggressive")]
        pattern: String,
    },

    /// Run a batch of battles for balance testing
    Batch {
        /// Number of battles to run
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Maximum parallel battles (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Starting seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Round bound per battle
        #[arg(long, default_value = "40")]
        max_rounds: u32,

        /// Player combatants (1-4)
        #[arg(long, default_value = "2")]
        party: usize,

        /// Enemy combatants (1-4)
        #[arg(long, default_value = "2")]
        enemies: usize,

        /// Enemy decision policy
        #[arg(long, default_value = "aggressive")]
        pattern: String,
    },

    /// Verify determinism by running the same seed multiple times
    Verify {
        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },
}

fn parse_pattern(name: &str) -> AiPattern {
    match name {
        "defensive" => AiPattern::Defensive,
        "tactical" => AiPattern::Tactical,
        "coward" => AiPattern::Coward,
        _ => AiPattern::Aggressive,
    }
}

fn main() {
    let cli = Cli::parse();

    // Logging to stderr; stdout carries results
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    match cli.command {
        Commands::Run {
            seed,
            party,
            enemies,
            pattern,
        } => {
            cmd_run(seed, party, enemies, &pattern);
        }
        Commands::Batch {
            count,
            parallel,
            output,
            seed,
            max_rounds,
            party,
            enemies,
            pattern,
        } => {
            cmd_batch(count, parallel, output, seed, max_rounds, party, enemies, &pattern);
        }
        Commands::Verify { seed, runs } => {
            cmd_verify(seed, runs);
        }
    }
}

/// Run a single battle and print its report as JSON.
fn cmd_run(seed: u64, party: usize, enemies: usize, pattern: &str) {
    let config = RunConfig::new(seed)
        .with_roster(party, enemies)
        .with_pattern(parse_pattern(pattern));

    match run_battle(&config) {
        Ok(report) => {
            let json = serde_json::to_string_pretty(&report)
                .unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"));
            println!("{json}");
        }
        Err(e) => {
            eprintln!("Battle failed: {e}");
            std::process::exit(1);
        }
    }
}

/// Run a batch and save results to the output directory.
#[allow(clippy::too_many_arguments)]
fn cmd_batch(
    count: u32,
    parallel: u32,
    output: PathBuf,
    seed: u64,
    max_rounds: u32,
    party: usize,
    enemies: usize,
    pattern: &str,
) {
    tracing::info!(
        count = count,
        parallel = parallel,
        seed = seed,
        output = %output.display(),
        "Batch configuration"
    );

    if let Err(e) = std::fs::create_dir_all(&output) {
        tracing::error!(error = %e, path = %output.display(), "Failed to create output directory");
        eprintln!(
            "FATAL: Cannot create output directory '{}': {}",
            output.display(),
            e
        );
        std::process::exit(1);
    }

    let config = BatchConfig {
        battle_count: count,
        parallel_battles: parallel,
        output_dir: output.clone(),
        seed_start: seed,
        max_rounds,
        party_size: party,
        enemy_count: enemies,
        pattern: parse_pattern(pattern),
    };

    let results = run_batch(config);

    let results_path = output.join("batch_results.json");
    if let Err(e) = results.save(&results_path) {
        tracing::error!(error = %e, path = %results_path.display(), "Failed to save results");
        eprintln!("FATAL: Failed to save results: {e}");
        std::process::exit(1);
    }

    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Battles played: {}", results.reports.len());
    if !results.errors.is_empty() {
        eprintln!("Battles FAILED: {}", results.errors.len());
    }
    eprintln!("Duration: {:.1}s", results.duration_seconds);
    eprintln!(
        "Throughput: {:.1} battles/sec",
        results.reports.len() as f64 / results.duration_seconds.max(0.001)
    );
    eprintln!(
        "\nPlayer win rate: {:.1}%",
        results.summary.player_win_rate * 100.0
    );
    eprintln!("Average rounds: {:.1}", results.summary.avg_rounds);
    eprintln!("Unresolved: {}", results.summary.unresolved);

    if !results.errors.is_empty() {
        eprintln!("\nBATTLE FAILURES:");
        for error in results.errors.iter().take(10) {
            eprintln!(
                "  Battle {} (seed {}): {}",
                error.battle_index, error.seed, error.message
            );
        }
        if results.errors.len() > 10 {
            eprintln!("  ... and {} more failures", results.errors.len() - 10);
        }
    }

    eprintln!("\nResults saved to: {}", results_path.display());
}

/// Verify determinism.
fn cmd_verify(seed: u64, runs: u32) {
    tracing::info!("Verifying determinism: seed {} ({} runs)", seed, runs);

    if battle_headless::batch::verify_determinism(seed, runs) {
        eprintln!("PASS: All {runs} runs produced identical results");
    } else {
        eprintln!("FAIL: Non-determinism detected!");
        std::process::exit(1);
    }
}
