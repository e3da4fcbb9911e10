//! # Battle Core
//!
//! Deterministic tactical battle engine for grid-based turn combat.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness (every draw goes through [`rng::DiceRoller`])
//! - No floating-point math (uses fixed-point)
//!
//! This separation enables:
//! - Bit-identical battle replays from a seed and an action stream
//! - Headless batch simulation for balance work
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`grid`] - Board, movement reachability, range and AoE geometry
//! - [`combatant`] - Combatant model and effective attributes
//! - [`status`] - Status-effect engine
//! - [`skill`] - Skills, damage/healing formulas, progression
//! - [`battle`] - Aggregate state, turn management, victory, rewards
//! - [`action`] - Action execution state machine
//! - [`dice`] - Strategic d20 boost system
//! - [`ai`] - Enemy decision policies
//! - [`records`] - External character/enemy input records
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod action;
pub mod ai;
pub mod battle;
pub mod combatant;
pub mod dice;
pub mod error;
pub mod grid;
pub mod math;
pub mod records;
pub mod rng;
pub mod skill;
pub mod status;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::action::BattleAction;
    pub use crate::ai::{enemy_turn_actions, AiPattern};
    pub use crate::battle::{
        calculate_turn_order, create_battle, BattleLogEntry, BattlePhase, BattleRewards,
        BattleState, LogKind,
    };
    pub use crate::combatant::{Attribute, BattleAttributes, BattleCombatant, Team};
    pub use crate::dice::{DicePurpose, DiceRollOutcome};
    pub use crate::error::{BattleError, Result};
    pub use crate::grid::{GridPosition, TerrainGrid, TileType, GRID_SIZE};
    pub use crate::math::Fixed;
    pub use crate::records::{Character, CharacterSkill, Enemy, EquippedItem};
    pub use crate::rng::{DiceRoller, SeededDice};
    pub use crate::skill::{
        sync_battle_skills_to_character, BattleSkill, DamageSpec, SkillCategory, SkillEffect,
        StatusApplication,
    };
    pub use crate::status::{ControlKind, StatusEffect, StatusKind};
}
