//! Headless battle runner for balance testing and CI verification.
//!
//! Runs AI-vs-AI battles without any presentation layer. This enables:
//!
//! - **Balance testing**: batches of seeded battles with aggregate
//!   win-rate and pacing metrics
//! - **CI verification**: determinism checks across repeated runs
//! - **Tuning**: compare decision policies against each other
//!
//! Output goes to stdout as JSON; human-readable logs go to stderr.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod batch;
pub mod metrics;
pub mod runner;

pub use batch::{run_batch, BatchConfig, BatchResults};
pub use metrics::{BatchSummary, BattleReport, Winner};
pub use runner::{run_battle, RunConfig};
