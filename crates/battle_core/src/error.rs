//! Error types for the battle engine.
//!
//! Every rejected action surfaces a typed reason instead of silently
//! returning the state unchanged, so callers and tests can distinguish
//! "illegal" from "had no effect".

use thiserror::Error;

/// Result type alias using [`BattleError`].
pub type Result<T> = std::result::Result<T, BattleError>;

/// Top-level error type for all battle engine errors.
///
/// Rejections are guaranteed to leave the battle state untouched:
/// every precondition is checked before the first mutation.
#[derive(Debug, Error)]
pub enum BattleError {
    /// The battle has already reached a terminal phase.
    #[error("Battle is over: phase is terminal")]
    BattleOver,

    /// The battle is still in its intro phase and accepts no actions.
    #[error("Battle has not begun")]
    NotStarted,

    /// Referenced combatant does not exist in this battle.
    #[error("Combatant not found: {0}")]
    CombatantNotFound(String),

    /// The acting combatant is at 0 HP.
    #[error("Combatant is defeated: {0}")]
    CombatantDefeated(String),

    /// The action was submitted for a combatant whose turn it is not.
    #[error("Not this combatant's turn: {0}")]
    OutOfTurn(String),

    /// The actor cannot afford the action.
    #[error("Insufficient action points: need {required}, have {available}")]
    InsufficientActionPoints {
        /// Action points the action costs.
        required: u32,
        /// Action points the actor has left.
        available: u32,
    },

    /// A second attack-class action (or a defend after one) this turn.
    #[error("Combatant already attacked or defended this turn")]
    AlreadyActed,

    /// Target tile is not reachable with the actor's remaining action points.
    #[error("Tile ({col}, {row}) is not reachable")]
    Unreachable {
        /// Target column.
        col: i32,
        /// Target row.
        row: i32,
    },

    /// The actor carries a root effect and cannot move.
    #[error("Combatant is rooted and cannot move")]
    Rooted,

    /// Target is beyond the action's range.
    #[error("Target out of range: distance {distance}, range {range}")]
    OutOfRange {
        /// Manhattan distance to the target.
        distance: u32,
        /// Maximum range of the action.
        range: u32,
    },

    /// The actor does not know the referenced skill.
    #[error("Skill not found: {0}")]
    SkillNotFound(String),

    /// The skill has no uses left this battle.
    #[error("Skill has no uses remaining: {0}")]
    SkillExhausted(String),

    /// The action needs a target and none (or a dead one) was given.
    #[error("Action requires a valid living target")]
    MissingTarget,

    /// No dice rolls left in the actor's per-battle pool.
    #[error("No dice rolls remaining")]
    NoDiceRolls,

    /// State serialization failure.
    #[error("Serialization failed: {0}")]
    Serialization(String),
}
