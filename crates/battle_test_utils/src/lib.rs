//! # Battle Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Scripted dice source for exact-outcome tests
//! - Fixture rosters and battle builders
//! - Determinism test harness
//! - Seeded autoplay driver

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;

/// Re-export proptest for convenience.
pub use proptest;
