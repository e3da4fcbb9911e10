//! Fixed-point math utilities for deterministic combat formulas.
//!
//! All fractional battle math (damage scaling, percent modifiers,
//! dice multipliers, chance thresholds) uses fixed-point arithmetic so
//! identical inputs produce bit-identical outcomes on every platform.

use fixed::types::I32F32;

/// Fixed-point number type for all engine math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Build a fixed-point fraction from a percentage value.
///
/// `percent(50)` is `0.5`, `percent(150)` is `1.5`.
#[must_use]
pub fn percent(value: i64) -> Fixed {
    Fixed::from_num(value) / Fixed::from_num(100)
}

/// Round a fixed-point value to the nearest integer, floored at a minimum.
#[must_use]
pub fn round_at_least(value: Fixed, min: i64) -> i64 {
    value.round().to_num::<i64>().max(min)
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}
